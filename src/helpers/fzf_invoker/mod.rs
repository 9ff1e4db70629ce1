use std::fmt::Display;
use anyhow::{Result, anyhow};
use termenu::{Item, Menu};

/// Terminal picker over a list of displayable items.
pub struct FzfInvoker<T> {
    title: String,
    items: Vec<T>,
}

impl<T> FzfInvoker<T>
where
    T: Display + Clone,
{
    pub fn new(title: impl Into<String>, items: Vec<T>) -> Self {
        Self {
            title: title.into(),
            items,
        }
    }

    /// Show the menu and return the picked item, `None` if the user cancelled.
    pub fn invoke(&self) -> Result<Option<T>> {
        let mut menu = Menu::new().map_err(|e| anyhow!("failed to init menu: {e}"))?;

        let list: Vec<Item<usize>> = self
            .items
            .iter()
            .enumerate()
            .map(|(idx, item)| Item::new(&item.to_string(), idx))
            .collect();

        let selected = menu
            .set_title(self.title.as_str())
            .add_list(list)
            .select()
            .map_err(|e| anyhow!("menu error: {e}"))?;

        Ok(selected.and_then(|idx| self.items.get(*idx).cloned()))
    }
}
