use super::*;

/// Channel statistics of the ImageNet corpus the backbone was pretrained on.
const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const STD: [f32; 3] = [0.229, 0.224, 0.225];

#[derive(Clone, Copy, Debug)]
pub(crate) struct Preprocessor {
  size: ImageSize,
}

impl Preprocessor {
  pub(crate) fn new(size: ImageSize) -> Self {
    Self { size }
  }

  /// Reads an image and turns it into a normalized `(1, 3, H, W)` batch.
  pub(crate) fn load(&self, path: &Path, device: &Device) -> Result<Tensor> {
    let image = Self::read_image(path)?;

    let array = self.transform(&image);

    let (channels, height, width) = array.dim();

    Ok(Tensor::from_vec(
      array.into_raw_vec_and_offset().0,
      (1, channels, height, width),
      device,
    )?)
  }

  fn read_image(path: &Path) -> Result<RgbImage> {
    let image_data = read(path)
      .with_context(|| format!("failed to read image `{}`", path.display()))?;

    let image: DynamicImage = image::load_from_memory(&image_data)
      .with_context(|| format!("failed to decode image `{}`", path.display()))?;

    Ok(image.to_rgb8())
  }

  pub(crate) fn transform(&self, image: &RgbImage) -> Array3<f32> {
    let mut array = Self::to_array(&self.resize(image));
    Self::normalize(&mut array);
    array
  }

  fn resize(&self, image: &RgbImage) -> RgbImage {
    let (width, height) = image.dimensions();

    let (target_width, target_height) = self.size.target(width, height);

    if (target_width, target_height) == (width, height) {
      return image.clone();
    }

    image::imageops::resize(
      image,
      target_width,
      target_height,
      FilterType::Triangle,
    )
  }

  /// Channel-first layout scaled to `[0, 1]`.
  fn to_array(image: &RgbImage) -> Array3<f32> {
    let (width, height) = image.dimensions();

    Array3::from_shape_fn(
      (3, height as usize, width as usize),
      |(channel, y, x)| {
        f32::from(image.get_pixel(x as u32, y as u32)[channel]) / 255.0
      },
    )
  }

  fn normalize(array: &mut Array3<f32>) {
    for (channel, mut plane) in array.axis_iter_mut(Axis(0)).enumerate() {
      plane.mapv_inplace(|value| (value - MEAN[channel]) / STD[channel]);
    }
  }
}
