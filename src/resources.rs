use super::*;

/// Locations of the files a prediction needs, all under one `Model`
/// directory that travels with the executable.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Resources {
  pub(crate) weights: PathBuf,
  pub(crate) metadata: PathBuf,
}

impl Resources {
  const DIRECTORY: &'static str = "Model";
  const METADATA: &'static str = "model_metadata.json";
  const WEIGHTS: &'static str = "grape_leaf_disease_model.pth";

  pub(crate) fn locate() -> Result<Self> {
    let executable = std::env::current_exe()
      .context("failed to resolve executable path")?;

    let root = executable.parent().with_context(|| {
      format!("executable path `{}` has no parent", executable.display())
    })?;

    Ok(Self::new(root))
  }

  pub(crate) fn new(root: &Path) -> Self {
    let directory = root.join(Self::DIRECTORY);

    Self {
      weights: directory.join(Self::WEIGHTS),
      metadata: directory.join(Self::METADATA),
    }
  }
}
