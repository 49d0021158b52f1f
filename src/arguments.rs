use super::*;

#[derive(Debug, Parser)]
#[clap(
  name = "predict",
  about = "Classify a grape leaf image and describe the detected disease",
  disable_help_flag = true,
  disable_version_flag = true
)]
pub(crate) struct Arguments {
  #[clap(help = "Path to the leaf image", allow_hyphen_values = true)]
  image: PathBuf,
}

impl Arguments {
  pub(crate) fn run(self) -> Result<Prediction> {
    let resources = Resources::locate()?;

    Predictor::load(&resources)?.predict(&self.image)
  }
}

#[cfg(test)]
mod tests {
  use {super::*, clap::error::ErrorKind};

  #[test]
  fn single_image_path() {
    let arguments = Arguments::try_parse_from(["predict", "leaf.jpg"]).unwrap();
    assert_eq!(arguments.image, PathBuf::from("leaf.jpg"));
  }

  #[test]
  fn missing_image_path() {
    assert_eq!(
      Arguments::try_parse_from(["predict"]).unwrap_err().kind(),
      ErrorKind::MissingRequiredArgument
    );
  }

  #[test]
  fn extra_arguments() {
    assert!(Arguments::try_parse_from(["predict", "a.jpg", "b.jpg"]).is_err());
  }

  #[test]
  fn leading_dash_is_an_image_path() {
    let arguments =
      Arguments::try_parse_from(["predict", "-leaf.jpg"]).unwrap();
    assert_eq!(arguments.image, PathBuf::from("-leaf.jpg"));
  }

  #[test]
  fn help_and_version_are_image_paths() {
    for flag in ["--help", "-h", "--version", "-V"] {
      let arguments = Arguments::try_parse_from(["predict", flag]).unwrap();
      assert_eq!(arguments.image, PathBuf::from(flag));
    }
  }

  #[test]
  fn extra_flag_is_a_usage_error() {
    assert!(Arguments::try_parse_from(["predict", "leaf.jpg", "--help"])
      .is_err());
  }
}
