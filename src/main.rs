use {
  crate::{
    arguments::Arguments,
    disease::DiseaseInfo,
    math::argmax,
    metadata::{ImageSize, Metadata},
    network::Network,
    predictor::Predictor,
    preprocess::Preprocessor,
    report::{Prediction, Report},
    resources::Resources,
  },
  anyhow::{bail, ensure, Context},
  candle_core::{DType, Device, Module, ModuleT, Tensor, D},
  candle_nn::{
    BatchNorm, Conv2d, Conv2dConfig, Dropout, Linear, VarBuilder,
  },
  clap::Parser,
  image::{imageops::FilterType, DynamicImage, RgbImage},
  ndarray::{Array1, Array3, ArrayView, Axis},
  serde::{Deserialize, Serialize},
  std::{
    fs::{read, File},
    io::{self, Write},
    path::{Path, PathBuf},
    process,
  },
  tracing::{debug, error},
};

mod arguments;
mod disease;
mod logging;
mod math;
mod metadata;
mod network;
mod predictor;
mod preprocess;
mod report;
mod resources;

type Result<T = (), E = anyhow::Error> = std::result::Result<T, E>;

fn main() {
  logging::init();

  let arguments = match Arguments::try_parse() {
    Ok(arguments) => arguments,
    Err(error) => {
      debug!("{error}");
      Report::usage().emit();
      process::exit(1);
    }
  };

  let report = match arguments.run() {
    Ok(prediction) => Report::Success(prediction),
    Err(error) => {
      error!("{error:?}");
      Report::failure(&error)
    }
  };

  report.emit();

  process::exit(report.exit_code());
}
