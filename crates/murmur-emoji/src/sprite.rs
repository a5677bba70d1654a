//! Sprite-sheet geometry for emoji images.

use serde::{Deserialize, Serialize};

use crate::data::SpriteCoordinates;

/// Which sheet emoji images are cut from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpriteSheet {
    /// Emoji set name, e.g. `twitter` or `apple`.
    pub set: String,
    /// Pixel size of one emoji on the sheet.
    pub sheet_size: u32,
    pub columns: u32,
    pub rows: u32,
    /// URL of the sheet image; `{set}` and `{sheet_size}` are substituted.
    pub url_template: String,
}

impl Default for SpriteSheet {
    fn default() -> Self {
        Self {
            set: "twitter".to_string(),
            sheet_size: 64,
            columns: 57,
            rows: 57,
            url_template:
                "https://unpkg.com/emoji-datasource-{set}@6.0.1/img/{set}/sheets-256/{sheet_size}.png"
                    .to_string(),
        }
    }
}

impl SpriteSheet {
    pub fn url(&self) -> String {
        self.url_template
            .replace("{set}", &self.set)
            .replace("{sheet_size}", &self.sheet_size.to_string())
    }

    /// Background styles that show the emoji at `coords`.
    pub fn style_for(&self, coords: &SpriteCoordinates) -> SpriteStyle {
        let step = 100.0 / f64::from(self.columns.saturating_sub(1).max(1));
        SpriteStyle {
            background_image: format!("url({})", self.url()),
            background_size: format!("{}% {}%", 100 * self.columns, 100 * self.rows),
            background_position: format!(
                "{}% {}%",
                step * f64::from(coords.x),
                step * f64::from(coords.y)
            ),
        }
    }
}

/// The three CSS properties an emoji image needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpriteStyle {
    pub background_image: String,
    pub background_size: String,
    pub background_position: String,
}

impl SpriteStyle {
    /// Inline `style` attribute value.
    pub fn to_css(&self) -> String {
        format!(
            "background-image: {}; background-size: {}; background-position: {};",
            self.background_image, self.background_size, self.background_position
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_url() {
        insta::assert_snapshot!(
            SpriteSheet::default().url(),
            @"https://unpkg.com/emoji-datasource-twitter@6.0.1/img/twitter/sheets-256/64.png"
        );
    }

    #[test]
    fn test_style_position() {
        let sheet = SpriteSheet::default();
        let style = sheet.style_for(&SpriteCoordinates {
            sheet: "twitter".into(),
            x: 28,
            y: 0,
        });
        assert_eq!(style.background_size, "5700% 5700%");
        assert_eq!(style.background_position, "50% 0%");
    }

    #[test]
    fn test_css() {
        let sheet = SpriteSheet {
            url_template: "/s/{set}-{sheet_size}.png".to_string(),
            ..SpriteSheet::default()
        };
        let style = sheet.style_for(&SpriteCoordinates {
            sheet: "twitter".into(),
            x: 56,
            y: 56,
        });
        insta::assert_snapshot!(
            style.to_css(),
            @"background-image: url(/s/twitter-64.png); background-size: 5700% 5700%; background-position: 100% 100%;"
        );
    }
}
