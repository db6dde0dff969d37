use std::collections::{HashMap, HashSet};

use iced::widget::{center, column, container, image, mouse_area, scrollable, text, Column};
use iced::{ContentFit, Element, Length, Pixels};
use iced_aw::Wrap;

use crate::state::data::Photo;
use crate::state::gallery::Gallery;
use crate::Message;

pub const THUMBNAIL_SIZE: f32 = 160.0;

/// Thumbnails downloaded this session, keyed by URL
#[derive(Debug, Default)]
pub struct ThumbnailCache {
    loaded: HashMap<String, image::Handle>,
    in_flight: HashSet<String>,
}

impl ThumbnailCache {
    pub fn get(&self, url: &str) -> Option<&image::Handle> {
        self.loaded.get(url)
    }

    /// URLs of `photos` neither cached nor downloading; they count as in flight
    /// from now on
    pub fn claim_missing(&mut self, photos: &[Photo]) -> Vec<String> {
        photos
            .iter()
            .map(|photo| &photo.thumbnail_url)
            .filter(|url| !url.is_empty() && !self.loaded.contains_key(*url))
            .filter(|url| self.in_flight.insert((*url).clone()))
            .cloned()
            .collect()
    }

    pub fn insert(&mut self, url: String, bytes: Vec<u8>) {
        self.in_flight.remove(&url);
        self.loaded.insert(url, image::Handle::from_bytes(bytes));
    }

    /// A download failed; the next claim asks for it again
    pub fn release(&mut self, url: &str) {
        self.in_flight.remove(url);
    }
}

/// Status line plus the wrapping thumbnail grid
pub fn view<'a>(gallery: &'a Gallery, thumbnails: &'a ThumbnailCache) -> Element<'a, Message> {
    let status = gallery.status();

    if gallery.display().is_empty() {
        return center(text(status.unwrap_or("No photos.")).size(18)).into();
    }

    let tiles: Vec<Element<'a, Message>> = gallery
        .display()
        .iter()
        .map(|photo| {
            mouse_area(thumbnail(thumbnails.get(&photo.thumbnail_url)))
                .on_press(Message::OpenPhoto(photo.clone()))
                .into()
        })
        .collect();

    let mut content: Column<Message> = column![].spacing(12).padding(16);
    if let Some(status) = status {
        content = content.push(text(status).size(14));
    }
    content = content.push(Wrap::with_elements(tiles).spacing(Pixels(8.0)).line_spacing(Pixels(8.0)));

    scrollable(content).width(Length::Fill).height(Length::Fill).into()
}

/// Cached thumbnail, or a placeholder box while it downloads
fn thumbnail<'a>(handle: Option<&image::Handle>) -> Element<'a, Message> {
    match handle {
        Some(handle) => image(handle.clone())
            .width(Length::Fixed(THUMBNAIL_SIZE))
            .height(Length::Fixed(THUMBNAIL_SIZE))
            .content_fit(ContentFit::Cover)
            .into(),
        None => container(text("…"))
            .width(Length::Fixed(THUMBNAIL_SIZE))
            .height(Length::Fixed(THUMBNAIL_SIZE))
            .center_x(Length::Fixed(THUMBNAIL_SIZE))
            .center_y(Length::Fixed(THUMBNAIL_SIZE))
            .style(container::rounded_box)
            .into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(id: &str, thumbnail: &str) -> Photo {
        Photo {
            id: id.to_string(),
            thumbnail_url: thumbnail.to_string(),
            hi_res_url: format!("https://img/{id}.jpg"),
            year: Some("2023".to_string()),
            event: None,
            day: None,
            team: None,
            misc: None,
        }
    }

    #[test]
    fn test_claims_each_url_once() {
        let mut cache = ThumbnailCache::default();
        let photos = vec![photo("a", "https://img/a_t.jpg"), photo("b", ""), photo("c", "https://img/a_t.jpg")];

        assert_eq!(cache.claim_missing(&photos), vec!["https://img/a_t.jpg".to_string()]);
        assert!(cache.claim_missing(&photos).is_empty());

        cache.insert("https://img/a_t.jpg".to_string(), vec![0u8; 4]);
        assert!(cache.get("https://img/a_t.jpg").is_some());
        assert!(cache.claim_missing(&photos).is_empty());
    }

    #[test]
    fn test_failed_download_is_claimed_again() {
        let mut cache = ThumbnailCache::default();
        let photos = vec![photo("a", "https://img/a_t.jpg")];

        cache.claim_missing(&photos);
        cache.release("https://img/a_t.jpg");

        assert_eq!(cache.claim_missing(&photos), vec!["https://img/a_t.jpg".to_string()]);
        assert!(cache.get("https://img/a_t.jpg").is_none());
    }
}
