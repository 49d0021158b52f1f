#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct DiseaseInfo {
  pub(crate) description: &'static str,
  pub(crate) treatment: &'static str,
}

impl DiseaseInfo {
  pub(crate) const UNKNOWN: DiseaseInfo = DiseaseInfo {
    description: "No description available",
    treatment: "No treatment information available",
  };

  const TABLE: [(&'static str, DiseaseInfo); 4] = [
    (
      "Black_Measles",
      DiseaseInfo {
        description: "Black Measles causes small dark spots on the grape leaf, often leading to leaf deformation.",
        treatment: "Remove infected leaves and apply recommended fungicides to control spread.",
      },
    ),
    (
      "Black_Rot",
      DiseaseInfo {
        description: "Black rot is a fungal disease causing dark spots and lesions on leaves and fruit.",
        treatment: "Apply fungicides and remove affected leaves and fruit to prevent further infection.",
      },
    ),
    (
      "Healthy",
      DiseaseInfo {
        description: "The grape leaf appears healthy with no visible signs of disease.",
        treatment: "No treatment required. Continue regular vineyard maintenance.",
      },
    ),
    (
      "Isariopsis_Leaf_Spot",
      DiseaseInfo {
        description: "Isariopsis Leaf Spot produces brown spots with yellow halos on leaves, which can lead to premature leaf drop.",
        treatment: "Remove infected leaves and use fungicides as recommended to prevent spread.",
      },
    ),
  ];

  pub(crate) fn get(key: &str) -> Option<DiseaseInfo> {
    Self::TABLE
      .iter()
      .find(|(name, _)| *name == key)
      .map(|(_, info)| *info)
  }

  /// Info for a class label as the model names it.
  pub(crate) fn for_class(class_name: &str) -> DiseaseInfo {
    match Self::get(canonical_key(class_name)) {
      Some(info) => info,
      None => Self::UNKNOWN,
    }
  }
}

/// Model labels whose table key is spelled differently.
const CLASS_MAPPING: [(&str, &str); 4] = [
  ("Healthy", "Healthy"),
  ("Black Rot", "Black_Rot"),
  ("Black Measles", "Black_Measles"),
  ("Isariopsis Leaf Spot", "Isariopsis_Leaf_Spot"),
];

pub(crate) fn canonical_key(class_name: &str) -> &str {
  CLASS_MAPPING
    .iter()
    .find(|(label, _)| *label == class_name)
    .map_or(class_name, |(_, key)| *key)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn mapped_labels() {
    assert_eq!(canonical_key("Black Rot"), "Black_Rot");
    assert_eq!(canonical_key("Black Measles"), "Black_Measles");
    assert_eq!(canonical_key("Isariopsis Leaf Spot"), "Isariopsis_Leaf_Spot");
    assert_eq!(canonical_key("Healthy"), "Healthy");
  }

  #[test]
  fn unmapped_label_is_its_own_key() {
    assert_eq!(canonical_key("Black_Rot"), "Black_Rot");
    assert_eq!(canonical_key("Downy Mildew"), "Downy Mildew");
  }

  #[test]
  fn every_mapping_target_has_info() {
    for (_, key) in CLASS_MAPPING {
      assert!(DiseaseInfo::get(key).is_some(), "{key} missing");
    }
  }

  #[test]
  fn lookup_through_mapping() {
    assert_eq!(
      DiseaseInfo::for_class("Black Rot"),
      DiseaseInfo::get("Black_Rot").unwrap()
    );

    assert!(DiseaseInfo::for_class("Healthy")
      .treatment
      .starts_with("No treatment required"));
  }

  #[test]
  fn unknown_class_falls_back() {
    let info = DiseaseInfo::for_class("Powdery Mildew");

    assert_eq!(info.description, "No description available");
    assert_eq!(info.treatment, "No treatment information available");
  }
}
