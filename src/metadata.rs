use super::*;

/// Target size for the resize step, as written by the training script.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(from = "RawImageSize")]
pub(crate) enum ImageSize {
  /// Shorter edge is scaled to this length, keeping the aspect ratio.
  Edge(u32),
  /// Exact `[height, width]`.
  Exact(u32, u32),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawImageSize {
  Edge(u32),
  EdgeList([u32; 1]),
  Exact(u32, u32),
}

impl From<RawImageSize> for ImageSize {
  fn from(size: RawImageSize) -> Self {
    match size {
      RawImageSize::Edge(edge) | RawImageSize::EdgeList([edge]) => {
        Self::Edge(edge)
      }
      RawImageSize::Exact(height, width) => Self::Exact(height, width),
    }
  }
}

impl ImageSize {
  /// Output `(width, height)` for an input of the given dimensions.
  pub(crate) fn target(self, width: u32, height: u32) -> (u32, u32) {
    match self {
      Self::Edge(edge) => {
        let scale = |long: u32, short: u32| {
          (u64::from(edge) * u64::from(long) / u64::from(short)) as u32
        };

        if width <= height {
          (edge, scale(height, width))
        } else {
          (scale(width, height), edge)
        }
      }
      Self::Exact(height, width) => (width, height),
    }
  }

  fn validate(self) -> Result {
    match self {
      Self::Edge(edge) => ensure!(edge > 0, "img_size must be positive"),
      Self::Exact(height, width) => {
        ensure!(height > 0 && width > 0, "img_size must be positive")
      }
    }

    Ok(())
  }
}

#[derive(Debug, Deserialize)]
pub(crate) struct Config {
  pub(crate) img_size: ImageSize,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Metadata {
  pub(crate) class_names: Vec<String>,
  pub(crate) config: Config,
}

impl Metadata {
  pub(crate) fn load(path: &Path) -> Result<Self> {
    let file = File::open(path).with_context(|| {
      format!("failed to open metadata file `{}`", path.display())
    })?;

    let metadata: Metadata = serde_json::from_reader(file)
      .context("failed to deserialize model metadata")?;

    debug!("Model class names: {:?}", metadata.class_names);

    metadata.validate()?;

    Ok(metadata)
  }

  fn validate(&self) -> Result {
    if self.class_names.is_empty() {
      bail!("model metadata lists no class names");
    }

    self.config.img_size.validate()
  }

  pub(crate) fn num_classes(&self) -> usize {
    self.class_names.len()
  }
}
