use super::*;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct Prediction {
  /// Class label exactly as the model metadata spells it.
  pub(crate) disease: String,
  pub(crate) confidence: f64,
  pub(crate) description: &'static str,
  pub(crate) treatment: &'static str,
}

impl Prediction {
  pub(crate) fn new(disease: String, confidence: f32) -> Self {
    let info = DiseaseInfo::for_class(&disease);

    Self {
      disease,
      confidence: f64::from(confidence),
      description: info.description,
      treatment: info.treatment,
    }
  }
}

/// The single JSON line written to stdout.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum Report {
  Success(Prediction),
  Failure { error: String },
}

impl Report {
  pub(crate) fn usage() -> Self {
    Self::Failure {
      error: "Image path is required".into(),
    }
  }

  pub(crate) fn failure(error: &anyhow::Error) -> Self {
    Self::Failure {
      error: format!("{error:#}"),
    }
  }

  pub(crate) fn exit_code(&self) -> i32 {
    match self {
      Self::Success(_) => 0,
      Self::Failure { .. } => 1,
    }
  }

  pub(crate) fn emit(&self) {
    if let Err(error) = self.write(io::stdout().lock()) {
      error!("failed to write report: {error:#}");
    }
  }

  fn write(&self, mut writer: impl Write) -> Result {
    serde_json::to_writer(&mut writer, self)
      .context("failed to serialize report")?;

    writeln!(writer)?;

    writer.flush()?;

    Ok(())
  }
}
