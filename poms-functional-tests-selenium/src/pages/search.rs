use anyhow::{bail, Result};
use chromiumoxide::page::Page;
use tracing::info;

use super::{xpath_literal, PageObject};
use crate::driver::Locator;

/// The inner elements of the media type cells of the result table.
pub const TYPE_CELLS: &str = "//td[@class='column-type']/child::*/child::*";

/// The inner elements of the broadcaster cells of the result table.
pub const BROADCASTER_CELLS: &str = "//td[@class='column-broadcasters']/child::*/child::*";

fn column_picker() -> Locator {
    Locator::css("button.column-edit")
}

fn column_option(column: &str) -> Locator {
    Locator::xpath(format!(
        "//ul[contains(@class, 'column-edit-menu')]//label[normalize-space(.)={}]",
        xpath_literal(column)
    ))
}

/// MID cell of the `row`th result, counting from 1.
fn mid_cell(row: usize) -> Locator {
    Locator::xpath(format!("(//td[@class='column-mid'])[{}]", row))
}

fn result_rows() -> Locator {
    Locator::css("table.search-results tbody tr")
}

fn menu_button(menu: &str) -> Locator {
    Locator::xpath(format!(
        "//div[contains(@class, 'search-facets')]//button[contains(normalize-space(.), {})]",
        xpath_literal(menu)
    ))
}

fn menu_option(option: &str) -> Locator {
    Locator::xpath(format!(
        "//ul[contains(@class, 'dropdown-menu')]//a[normalize-space(.)={}]",
        xpath_literal(option)
    ))
}

fn selected_option_remover(option: &str) -> Locator {
    Locator::xpath(format!(
        "//span[contains(@class, 'facet-selected')][contains(normalize-space(.), {})]//button",
        xpath_literal(option)
    ))
}

fn column_header(column: &str) -> Locator {
    Locator::xpath(format!(
        "//th[contains(normalize-space(.), {})]",
        xpath_literal(column)
    ))
}

/// The search screen, also shown in the CMS selector popup.
pub struct SearchPage {
    page: PageObject,
}

impl SearchPage {
    pub fn new(page: Page) -> Self {
        Self {
            page: PageObject::new(page),
        }
    }

    /// Toggles the visibility of a result column.
    pub async fn add_or_remove_column(&self, column: &str) -> Result<()> {
        info!("Toggling column {}", column);
        self.page.click(&column_picker()).await?;
        self.page.click(&column_option(column)).await?;
        self.page.click(&column_picker()).await
    }

    /// The MID shown in the `row`th result, counting from 1.
    pub async fn mid_from_column(&self, row: usize) -> Result<String> {
        self.page.inner_text(&mid_cell(row)).await
    }

    /// Clicks the `index`th result, counting from 0.
    pub async fn click_row(&self, index: usize) -> Result<()> {
        self.page.wait_for_angular().await?;
        let rows = self.page.wait_for_all(&result_rows()).await?;
        let Some(row) = rows.get(index) else {
            bail!("Only {} rows, no row {}", rows.len(), index);
        };
        row.click().await?;
        Ok(())
    }

    /// Selects `option` in the facet menu `menu`, which narrows the results.
    pub async fn select_option_from_menu(&self, menu: &str, option: &str) -> Result<()> {
        info!("Selecting {} in {}", option, menu);
        self.page.click(&menu_button(menu)).await?;
        self.page.click(&menu_option(option)).await?;
        self.page.wait_for_angular().await
    }

    pub async fn remove_selected_option(&self, option: &str) -> Result<()> {
        info!("Removing {}", option);
        self.page.click(&selected_option_remover(option)).await?;
        self.page.wait_for_angular().await
    }

    /// Clicks a column header, which sorts on it.
    pub async fn click_on_column(&self, column: &str) -> Result<()> {
        self.page.click(&column_header(column)).await?;
        self.page.wait_for_angular().await
    }

    /// Fails unless every element matching `locator` reads `text`.
    /// Returns the number of elements checked.
    pub async fn rows_with_text_equal(&self, locator: &Locator, text: &str) -> Result<usize> {
        self.page.wait_for_angular().await?;
        let elements = self.page.wait_for_all(locator).await?;
        for (i, element) in elements.iter().enumerate() {
            let actual = element.inner_text().await?.unwrap_or_default();
            if actual.trim() != text {
                bail!("Row {} of {} reads '{}', not '{}'", i, locator, actual.trim(), text);
            }
        }
        info!("{} rows read '{}'", elements.len(), text);
        Ok(elements.len())
    }
}
