use super::*;

const BATCH_NORM_EPS: f64 = 1e-5;
const STEM_CHANNELS: usize = 32;
const HEAD_CHANNELS: usize = 1280;
const HIDDEN_FEATURES: usize = 256;
const DROPOUT: f32 = 0.3;
const SQUEEZE_RATIO: f64 = 0.25;

struct Stage {
  repeats: usize,
  kernel: usize,
  stride: usize,
  expansion: usize,
  channels: usize,
}

/// EfficientNet-B0. The first stage uses depthwise-separable blocks, the
/// rest inverted residuals.
const STAGES: [Stage; 7] = [
  Stage { repeats: 1, kernel: 3, stride: 1, expansion: 1, channels: 16 },
  Stage { repeats: 2, kernel: 3, stride: 2, expansion: 6, channels: 24 },
  Stage { repeats: 2, kernel: 5, stride: 2, expansion: 6, channels: 40 },
  Stage { repeats: 3, kernel: 3, stride: 2, expansion: 6, channels: 80 },
  Stage { repeats: 3, kernel: 5, stride: 1, expansion: 6, channels: 112 },
  Stage { repeats: 4, kernel: 5, stride: 2, expansion: 6, channels: 192 },
  Stage { repeats: 1, kernel: 3, stride: 1, expansion: 6, channels: 320 },
];

fn conv_config(kernel: usize, stride: usize, groups: usize) -> Conv2dConfig {
  Conv2dConfig {
    padding: kernel / 2,
    stride,
    groups,
    ..Default::default()
  }
}

/// Bias-free convolution followed by batch norm and optionally SiLU.
#[derive(Debug)]
struct ConvNorm {
  conv: Conv2d,
  norm: BatchNorm,
  activation: bool,
}

impl ConvNorm {
  fn load(
    in_channels: usize,
    out_channels: usize,
    kernel: usize,
    config: Conv2dConfig,
    activation: bool,
    conv: VarBuilder,
    norm: VarBuilder,
  ) -> Result<Self> {
    Ok(Self {
      conv: candle_nn::conv2d_no_bias(
        in_channels,
        out_channels,
        kernel,
        config,
        conv,
      )?,
      norm: candle_nn::batch_norm(out_channels, BATCH_NORM_EPS, norm)?,
      activation,
    })
  }
}

impl ModuleT for ConvNorm {
  fn forward_t(
    &self,
    xs: &Tensor,
    train: bool,
  ) -> candle_core::Result<Tensor> {
    let xs = xs.apply(&self.conv)?.apply_t(&self.norm, train)?;

    if self.activation {
      xs.silu()
    } else {
      Ok(xs)
    }
  }
}

#[derive(Debug)]
struct SqueezeExcite {
  reduce: Conv2d,
  expand: Conv2d,
}

impl SqueezeExcite {
  fn load(channels: usize, reduced: usize, vb: VarBuilder) -> Result<Self> {
    Ok(Self {
      reduce: candle_nn::conv2d(
        channels,
        reduced,
        1,
        Conv2dConfig::default(),
        vb.pp("conv_reduce"),
      )?,
      expand: candle_nn::conv2d(
        reduced,
        channels,
        1,
        Conv2dConfig::default(),
        vb.pp("conv_expand"),
      )?,
    })
  }
}

impl Module for SqueezeExcite {
  fn forward(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
    let scale = xs
      .mean_keepdim(D::Minus1)?
      .mean_keepdim(D::Minus2)?
      .apply(&self.reduce)?
      .silu()?
      .apply(&self.expand)?;

    xs.broadcast_mul(&candle_nn::ops::sigmoid(&scale)?)
  }
}

#[derive(Debug)]
struct Block {
  expand: Option<ConvNorm>,
  depthwise: ConvNorm,
  squeeze_excite: SqueezeExcite,
  project: ConvNorm,
  residual: bool,
}

impl Block {
  fn load(
    in_channels: usize,
    stage: &Stage,
    stride: usize,
    vb: VarBuilder,
  ) -> Result<Self> {
    let mid_channels = in_channels * stage.expansion;

    let reduced =
      ((in_channels as f64 * SQUEEZE_RATIO).round() as usize).max(1);

    let depthwise_config = conv_config(stage.kernel, stride, mid_channels);

    let pointwise_config = conv_config(1, 1, 1);

    let squeeze_excite =
      SqueezeExcite::load(mid_channels, reduced, vb.pp("se"))?;

    let residual = stride == 1 && in_channels == stage.channels;

    if stage.expansion == 1 {
      return Ok(Self {
        expand: None,
        depthwise: ConvNorm::load(
          in_channels,
          mid_channels,
          stage.kernel,
          depthwise_config,
          true,
          vb.pp("conv_dw"),
          vb.pp("bn1"),
        )?,
        squeeze_excite,
        project: ConvNorm::load(
          mid_channels,
          stage.channels,
          1,
          pointwise_config,
          false,
          vb.pp("conv_pw"),
          vb.pp("bn2"),
        )?,
        residual,
      });
    }

    Ok(Self {
      expand: Some(ConvNorm::load(
        in_channels,
        mid_channels,
        1,
        pointwise_config,
        true,
        vb.pp("conv_pw"),
        vb.pp("bn1"),
      )?),
      depthwise: ConvNorm::load(
        mid_channels,
        mid_channels,
        stage.kernel,
        depthwise_config,
        true,
        vb.pp("conv_dw"),
        vb.pp("bn2"),
      )?,
      squeeze_excite,
      project: ConvNorm::load(
        mid_channels,
        stage.channels,
        1,
        pointwise_config,
        false,
        vb.pp("conv_pwl"),
        vb.pp("bn3"),
      )?,
      residual,
    })
  }
}

impl ModuleT for Block {
  fn forward_t(
    &self,
    xs: &Tensor,
    train: bool,
  ) -> candle_core::Result<Tensor> {
    let mut ys = xs.clone();

    if let Some(expand) = &self.expand {
      ys = ys.apply_t(expand, train)?;
    }

    let ys = ys
      .apply_t(&self.depthwise, train)?
      .apply(&self.squeeze_excite)?
      .apply_t(&self.project, train)?;

    if self.residual {
      ys + xs
    } else {
      Ok(ys)
    }
  }
}

/// Replacement classification head:
/// linear, batch norm, ReLU, dropout, linear.
#[derive(Debug)]
struct Head {
  hidden: Linear,
  norm: BatchNorm,
  dropout: Dropout,
  output: Linear,
}

impl Head {
  fn load(num_classes: usize, vb: VarBuilder) -> Result<Self> {
    Ok(Self {
      hidden: candle_nn::linear(HEAD_CHANNELS, HIDDEN_FEATURES, vb.pp(0))?,
      norm: candle_nn::batch_norm(HIDDEN_FEATURES, BATCH_NORM_EPS, vb.pp(1))?,
      dropout: Dropout::new(DROPOUT),
      output: candle_nn::linear(HIDDEN_FEATURES, num_classes, vb.pp(4))?,
    })
  }
}

impl ModuleT for Head {
  fn forward_t(
    &self,
    xs: &Tensor,
    train: bool,
  ) -> candle_core::Result<Tensor> {
    xs.apply(&self.hidden)?
      .apply_t(&self.norm, train)?
      .relu()?
      .apply_t(&self.dropout, train)?
      .apply(&self.output)
  }
}

/// EfficientNet-B0 backbone with the custom classifier head, laid out with
/// the parameter names of a timm `efficientnet_b0` state dict.
#[derive(Debug)]
pub(crate) struct Network {
  stem: ConvNorm,
  blocks: Vec<Block>,
  head: ConvNorm,
  classifier: Head,
  num_classes: usize,
}

impl Network {
  pub(crate) fn load(vb: VarBuilder, num_classes: usize) -> Result<Self> {
    let stem = ConvNorm::load(
      3,
      STEM_CHANNELS,
      3,
      conv_config(3, 2, 1),
      true,
      vb.pp("conv_stem"),
      vb.pp("bn1"),
    )?;

    let mut blocks = Vec::new();

    let mut in_channels = STEM_CHANNELS;

    for (stage_index, stage) in STAGES.iter().enumerate() {
      for block_index in 0..stage.repeats {
        let stride = if block_index == 0 { stage.stride } else { 1 };

        blocks.push(Block::load(
          in_channels,
          stage,
          stride,
          vb.pp("blocks").pp(stage_index).pp(block_index),
        )?);

        in_channels = stage.channels;
      }
    }

    let head = ConvNorm::load(
      in_channels,
      HEAD_CHANNELS,
      1,
      conv_config(1, 1, 1),
      true,
      vb.pp("conv_head"),
      vb.pp("bn2"),
    )?;

    let classifier = Head::load(num_classes, vb.pp("classifier"))?;

    Ok(Self {
      stem,
      blocks,
      head,
      classifier,
      num_classes,
    })
  }

  pub(crate) fn num_classes(&self) -> usize {
    self.num_classes
  }
}

impl ModuleT for Network {
  fn forward_t(
    &self,
    xs: &Tensor,
    train: bool,
  ) -> candle_core::Result<Tensor> {
    let mut xs = xs.apply_t(&self.stem, train)?;

    for block in &self.blocks {
      xs = xs.apply_t(block, train)?;
    }

    xs.apply_t(&self.head, train)?
      .mean(D::Minus1)?
      .mean(D::Minus1)?
      .apply_t(&self.classifier, train)
  }
}

#[cfg(test)]
mod tests {
  use {super::*, approx::assert_relative_eq, candle_nn::VarMap};

  fn random_network(varmap: &VarMap, num_classes: usize) -> Result<Network> {
    Network::load(
      VarBuilder::from_varmap(varmap, DType::F32, &Device::Cpu),
      num_classes,
    )
  }

  fn input(height: usize, width: usize) -> Tensor {
    Tensor::randn(0f32, 1f32, (1, 3, height, width), &Device::Cpu).unwrap()
  }

  #[test]
  fn block_count() {
    let varmap = VarMap::new();

    let network = random_network(&varmap, 4).unwrap();

    assert_eq!(network.blocks.len(), 16);
    assert_eq!(network.num_classes(), 4);
  }

  #[test]
  fn parameter_layout() {
    let varmap = VarMap::new();

    random_network(&varmap, 4).unwrap();

    let data = varmap.data().lock().unwrap();

    let shape = |name: &str| data[name].as_tensor().dims().to_vec();

    assert_eq!(shape("conv_stem.weight"), [32, 3, 3, 3]);
    assert_eq!(shape("blocks.0.0.conv_dw.weight"), [32, 1, 3, 3]);
    assert_eq!(shape("blocks.0.0.se.conv_reduce.weight"), [8, 32, 1, 1]);
    assert_eq!(shape("blocks.0.0.conv_pw.weight"), [16, 32, 1, 1]);
    assert_eq!(shape("blocks.1.0.conv_pw.weight"), [96, 16, 1, 1]);
    assert_eq!(shape("blocks.1.0.se.conv_reduce.weight"), [4, 96, 1, 1]);
    assert_eq!(shape("blocks.2.0.conv_dw.weight"), [144, 1, 5, 5]);
    assert_eq!(shape("blocks.6.0.conv_pwl.weight"), [320, 1152, 1, 1]);
    assert_eq!(shape("blocks.6.0.bn3.running_var"), [320]);
    assert_eq!(shape("conv_head.weight"), [1280, 320, 1, 1]);
    assert_eq!(shape("classifier.0.weight"), [256, 1280]);
    assert_eq!(shape("classifier.1.running_mean"), [256]);
    assert_eq!(shape("classifier.4.weight"), [4, 256]);
    assert_eq!(shape("classifier.4.bias"), [4]);
  }

  #[test]
  fn forward_produces_one_logit_per_class() {
    let varmap = VarMap::new();

    let network = random_network(&varmap, 4).unwrap();

    let logits = network.forward_t(&input(64, 48), false).unwrap();

    assert_eq!(logits.dims(), &[1, 4]);
  }

  #[test]
  fn evaluation_is_deterministic() {
    let varmap = VarMap::new();

    let network = random_network(&varmap, 3).unwrap();

    let input = input(32, 32);

    let first = network
      .forward_t(&input, false)
      .unwrap()
      .flatten_all()
      .unwrap()
      .to_vec1::<f32>()
      .unwrap();

    let second = network
      .forward_t(&input, false)
      .unwrap()
      .flatten_all()
      .unwrap()
      .to_vec1::<f32>()
      .unwrap();

    for (a, b) in first.iter().zip(&second) {
      assert_relative_eq!(a, b, epsilon = 1e-6);
    }
  }

  #[test]
  fn class_count_mismatch_fails_to_load() {
    let varmap = VarMap::new();

    random_network(&varmap, 4).unwrap();

    assert!(random_network(&varmap, 3).is_err());
  }
}
