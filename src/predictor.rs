use super::*;

/// A loaded model together with the metadata that gives its outputs names.
#[derive(Debug)]
pub(crate) struct Predictor {
  metadata: Metadata,
  network: Network,
  device: Device,
}

impl Predictor {
  pub(crate) fn load(resources: &Resources) -> Result<Self> {
    let metadata = Metadata::load(&resources.metadata)?;

    let device = Device::cuda_if_available(0)?;

    let vb = VarBuilder::from_pth(&resources.weights, DType::F32, &device)
      .with_context(|| {
        format!(
          "failed to read model weights `{}`",
          resources.weights.display()
        )
      })?;

    let network = Network::load(vb, metadata.num_classes())
      .context("model weights do not match the network architecture")?;

    Ok(Self::new(metadata, network, device))
  }

  pub(crate) fn new(
    metadata: Metadata,
    network: Network,
    device: Device,
  ) -> Self {
    Self {
      metadata,
      network,
      device,
    }
  }

  pub(crate) fn predict(&self, image: &Path) -> Result<Prediction> {
    let input = Preprocessor::new(self.metadata.config.img_size)
      .load(image, &self.device)?;

    let probabilities = self.probabilities(&input)?;

    let index = argmax(&probabilities.view())
      .context("model produced no class probabilities")?;

    let confidence = probabilities[index];

    ensure!(
      confidence.is_finite(),
      "model produced non-finite class probabilities"
    );

    Ok(Prediction::new(
      self.metadata.class_names[index].clone(),
      confidence,
    ))
  }

  /// Softmax over the logits of a single-image batch, in evaluation mode.
  fn probabilities(&self, input: &Tensor) -> Result<Array1<f32>> {
    let logits = self.network.forward_t(input, false)?;

    let num_classes = self.metadata.num_classes();

    ensure!(
      self.network.num_classes() == num_classes
        && logits.dims() == [1, num_classes],
      "model produced logits of shape {:?} for {} classes",
      logits.dims(),
      num_classes
    );

    let probabilities = candle_nn::ops::softmax(&logits, D::Minus1)?
      .squeeze(0)?
      .to_vec1::<f32>()?;

    Ok(Array1::from(probabilities))
  }
}
