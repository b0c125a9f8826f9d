//! Page chrome around the cart: the mobile menu, the product gallery, the quick-view modal
//! and variant option matching.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MobileMenu {
    pub open: bool,
    /// Set once the menu items have been staggered in.
    pub items_animated: bool,
}

impl MobileMenu {
    pub fn toggle(&mut self) -> bool {
        self.open = !self.open;
        if self.open {
            self.items_animated = true;
        }
        true
    }

    pub fn close(&mut self) -> bool {
        if !self.open {
            return false;
        }
        self.open = false;
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Thumbnail {
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductGallery {
    pub main_image: Option<String>,
    pub thumbnails: Vec<Thumbnail>,
    pub active: Option<usize>,
}

impl ProductGallery {
    pub fn new(main_image: Option<String>, thumbnails: Vec<Thumbnail>) -> Self {
        Self {
            main_image,
            thumbnails,
            active: None,
        }
    }

    /// Shows the thumbnail's image; thumbnails without an image are ignored.
    pub fn select(&mut self, index: usize) -> bool {
        let Some(image) = self.thumbnails.get(index).and_then(|t| t.image.clone()) else {
            return false;
        };
        self.main_image = Some(image);
        self.active = Some(index);
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickViewContent {
    pub title: String,
    pub image_src: Option<String>,
    pub price: String,
    pub link: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuickViewModal {
    pub open: bool,
    pub product_url: Option<String>,
    /// `None` while loading.
    pub content: Option<QuickViewContent>,
}

impl QuickViewModal {
    pub fn open(&mut self, product_url: &str) -> bool {
        self.open = true;
        self.product_url = Some(product_url.to_string());
        self.content = None;
        true
    }

    pub fn close(&mut self) -> bool {
        if !self.open {
            return false;
        }
        self.open = false;
        true
    }

    pub fn is_loading(&self) -> bool {
        self.open && self.content.is_none()
    }

    /// Fills the modal, unless it has since been closed or pointed at another product.
    pub fn populate(&mut self, product_url: &str, content: QuickViewContent) -> bool {
        if !self.open || self.product_url.as_deref() != Some(product_url) {
            return false;
        }
        self.content = Some(content);
        true
    }
}

/// Index of the first variant whose title contains the selected options joined by `" / "`.
///
/// A single selected option is matched by title like any other selection; it does not jump to
/// the first variant.
pub fn match_variant<S: AsRef<str>>(selected_options: &[S], variant_titles: &[S]) -> Option<usize> {
    if selected_options.is_empty() {
        return None;
    }
    let wanted = selected_options
        .iter()
        .map(|o| o.as_ref())
        .collect::<Vec<_>>()
        .join(" / ");
    variant_titles
        .iter()
        .position(|title| title.as_ref().contains(&wanted))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_toggle_and_close() {
        let mut menu = MobileMenu::default();
        assert!(!menu.close());
        menu.toggle();
        assert!(menu.open);
        assert!(menu.items_animated);
        assert!(menu.close());
        assert!(!menu.open);
    }

    #[test]
    fn test_gallery_ignores_thumbnails_without_image() {
        let mut gallery = ProductGallery::new(
            Some("main.jpg".to_string()),
            vec![
                Thumbnail { image: Some("a.jpg".to_string()) },
                Thumbnail { image: None },
            ],
        );
        assert!(!gallery.select(1));
        assert!(!gallery.select(7));
        assert_eq!(gallery.main_image.as_deref(), Some("main.jpg"));
        assert!(gallery.select(0));
        assert_eq!(gallery.main_image.as_deref(), Some("a.jpg"));
        assert_eq!(gallery.active, Some(0));
    }

    #[test]
    fn test_quick_view_ignores_stale_content() {
        let mut modal = QuickViewModal::default();
        modal.open("/products/a");
        assert!(modal.is_loading());
        let content = QuickViewContent {
            title: "A".to_string(),
            image_src: None,
            price: "$1.00".to_string(),
            link: "/products/a".to_string(),
        };
        assert!(!modal.populate("/products/b", content.clone()));
        assert!(modal.populate("/products/a", content));
        assert!(!modal.is_loading());
    }

    #[test]
    fn test_match_variant() {
        let titles = ["Small / Red - $10", "Small / Blue - $10", "Large / Blue - $12"];
        assert_eq!(match_variant(&["Small", "Blue"], &titles), Some(1));
        assert_eq!(match_variant(&["Large", "Blue"], &titles), Some(2));
        assert_eq!(match_variant(&["Huge", "Blue"], &titles), None);
        assert_eq!(match_variant::<&str>(&[], &titles), None);
    }
}
