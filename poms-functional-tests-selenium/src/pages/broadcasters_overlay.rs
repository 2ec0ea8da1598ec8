use anyhow::Result;
use chromiumoxide::page::Page;
use tracing::info;

use super::PageObject;
use crate::driver::Locator;

// every field of a new broadcaster gets the same value
const FIELDS: [&str; 5] = ["id", "text", "wonId", "neboId", "pdId"];

fn add_button() -> Locator {
    Locator::css("button.modal-broadcasters-add")
}

fn field(name: &str) -> Locator {
    Locator::css(format!("input[name={}]", name))
}

fn save_button() -> Locator {
    Locator::xpath("//button[contains(text(), 'bewaar')]")
}

fn close_button() -> Locator {
    Locator::css("div.modal-header button.close")
}

/// The admin overlay listing broadcasters.
pub struct BroadcastersOverlayPage {
    page: PageObject,
}

impl BroadcastersOverlayPage {
    pub fn new(page: Page) -> Self {
        Self {
            page: PageObject::new(page),
        }
    }

    pub async fn add_broadcaster(&self, broadcaster: &str) -> Result<()> {
        info!("Adding broadcaster {}", broadcaster);
        self.page.click(&add_button()).await?;
        for name in FIELDS {
            self.page.type_text(&field(name), broadcaster).await?;
        }
        self.page.click(&save_button()).await
    }

    pub async fn close(&self) -> Result<()> {
        self.page.click(&close_button()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_locators() {
        let locators: Vec<String> = FIELDS.iter().map(|name| field(name).to_string()).collect();
        assert_eq!(
            locators,
            vec![
                "css=input[name=id]",
                "css=input[name=text]",
                "css=input[name=wonId]",
                "css=input[name=neboId]",
                "css=input[name=pdId]",
            ]
        );
    }
}
