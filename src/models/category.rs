//! Course categories and their catalog styling.

use serde::{Deserialize, Serialize};

const DEFAULT_COLOR: &str = "#3498db";
const DEFAULT_ICON: &str = "fas fa-book";

/// Category document, used to populate selection lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "_firestore_id", default, skip_serializing)]
    pub id: String,
    pub name: String,
}

/// Card/header color for a category name.
pub fn category_color(category: &str) -> &'static str {
    match category {
        "Développement" => "#3498db",
        "Data Science" => "#2ecc71",
        "Cybersécurité" => "#e74c3c",
        "Marketing" => "#f39c12",
        "Management" => "#9b59b6",
        "Design" => "#1abc9c",
        _ => DEFAULT_COLOR,
    }
}

/// Icon class for a category name.
pub fn category_icon(category: &str) -> &'static str {
    match category {
        "Développement" => "fas fa-laptop-code",
        "Data Science" => "fas fa-chart-bar",
        "Cybersécurité" => "fas fa-shield-alt",
        "Marketing" => "fas fa-bullhorn",
        "Management" => "fas fa-briefcase",
        "Design" => "fas fa-palette",
        _ => DEFAULT_ICON,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_category_styling() {
        assert_eq!(category_color("Cybersécurité"), "#e74c3c");
        assert_eq!(category_icon("Data Science"), "fas fa-chart-bar");
    }

    #[test]
    fn test_unknown_category_falls_back() {
        assert_eq!(category_color("Cuisine"), DEFAULT_COLOR);
        assert_eq!(category_icon(""), DEFAULT_ICON);
    }
}
