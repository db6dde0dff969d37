use cgmath::{vec2, Vector2};
use iced::keyboard;
use iced::widget::{button, canvas, center, column, container, horizontal_space, image, mouse_area, opaque, row, stack, text};
use iced::{Color, Element, Length, Subscription, Task, Theme};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod error;
mod state;
mod ui;

use api::client::{ApiClient, LoadedImage};
use api::request::{Fetch, FetchOutcome, Ticket};
use config::Config;
use error::FetchError;
use state::data::{Facet, Photo};
use state::gallery::Gallery;
use ui::canvas::{ViewerEvent, ZoomableImage};
use ui::grid::ThumbnailCache;
use ui::zoom::ZoomPanTransform;

/// A decoded hi-res photo ready for the canvas
struct OpenImage {
    handle: image::Handle,
    natural: Vector2<f32>,
}

/// The hi-res modal
struct Viewer {
    photo: Photo,
    image: Option<OpenImage>,
    loading: bool,
}

/// Main application state
struct TrackPhotoViewer {
    /// Filter, similarity and display state
    gallery: Gallery,
    client: ApiClient,
    thumbnails: ThumbnailCache,
    viewer: Option<Viewer>,
    zoom: ZoomPanTransform,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    /// User clicked a filter value
    Toggle(Facet, String),
    /// "Clear All Filters"
    ClearFilters,
    DensityChanged(u8),
    /// Leave similarity mode
    BackToFilters,
    /// A filter/photo/similarity response arrived
    Fetched(Ticket, FetchOutcome),
    ThumbnailLoaded(String, Result<Vec<u8>, Arc<FetchError>>),
    /// User clicked a thumbnail
    OpenPhoto(Photo),
    HiResLoaded(String, Result<LoadedImage, Arc<FetchError>>),
    /// "More like this" on the open photo
    MoreLikeThis,
    CloseViewer,
    Viewer(ViewerEvent),
}

impl TrackPhotoViewer {
    fn new(config: Config, client: ApiClient) -> (Self, Task<Message>) {
        let mut gallery = Gallery::new(config.similar_limit);
        let fetches = gallery.start();

        info!("📷 Track Photo Viewer initialized");

        let app = TrackPhotoViewer {
            gallery,
            client,
            thumbnails: ThumbnailCache::default(),
            viewer: None,
            zoom: ZoomPanTransform::new(),
        };
        let task = app.dispatch(fetches);
        (app, task)
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        // only these can change which photos are displayed
        let redisplays = matches!(
            message,
            Message::Toggle(..)
                | Message::ClearFilters
                | Message::DensityChanged(_)
                | Message::BackToFilters
                | Message::Fetched(..)
                | Message::MoreLikeThis
        );

        let task = match message {
            Message::Toggle(facet, value) => {
                let fetches = self.gallery.toggle(facet, &value);
                self.dispatch(fetches)
            }
            Message::ClearFilters => {
                let fetches = self.gallery.clear();
                self.dispatch(fetches)
            }
            Message::DensityChanged(value) => {
                self.gallery.set_density(value);
                Task::none()
            }
            Message::BackToFilters => {
                let fetches = self.gallery.clear_similarity();
                self.dispatch(fetches)
            }
            Message::Fetched(ticket, outcome) => {
                let fetches = self.gallery.apply(ticket, outcome);
                self.dispatch(fetches)
            }
            Message::ThumbnailLoaded(url, result) => {
                match result {
                    Ok(bytes) => self.thumbnails.insert(url, bytes),
                    Err(e) => {
                        warn!("⚠️  Thumbnail {} failed: {}", url, e);
                        self.thumbnails.release(&url);
                    }
                }
                Task::none()
            }
            Message::OpenPhoto(photo) => self.open(photo),
            Message::HiResLoaded(url, result) => {
                self.hi_res_loaded(&url, result);
                Task::none()
            }
            Message::MoreLikeThis => match self.viewer.take() {
                Some(viewer) => {
                    self.zoom.reset();
                    let fetches = self.gallery.request_similar_to(viewer.photo);
                    self.dispatch(fetches)
                }
                None => Task::none(),
            },
            Message::CloseViewer => {
                self.viewer = None;
                self.zoom.reset();
                Task::none()
            }
            Message::Viewer(event) => {
                self.viewer_event(event);
                Task::none()
            }
        };

        if redisplays {
            Task::batch([task, self.load_thumbnails()])
        } else {
            task
        }
    }

    /// Turn session fetches into background tasks
    fn dispatch(&self, fetches: Vec<Fetch>) -> Task<Message> {
        Task::batch(fetches.into_iter().map(|fetch| {
            let ticket = fetch.ticket;
            Task::perform(self.client.clone().execute(fetch.query), move |result| {
                Message::Fetched(ticket, result.map_err(Arc::new))
            })
        }))
    }

    /// Download thumbnails for displayed photos not cached yet.
    /// Failed ones are retried the next time the display changes.
    fn load_thumbnails(&mut self) -> Task<Message> {
        let wanted = self.thumbnails.claim_missing(self.gallery.display());

        Task::batch(wanted.into_iter().map(|url| {
            Task::perform(self.client.clone().fetch_bytes(url.clone()), move |result| {
                Message::ThumbnailLoaded(url.clone(), result.map_err(Arc::new))
            })
        }))
    }

    fn open(&mut self, photo: Photo) -> Task<Message> {
        let url = photo.hi_res_url.clone();
        info!("🔎 Opening {}", photo.id);

        self.viewer = Some(Viewer {
            photo,
            image: None,
            loading: true,
        });
        self.zoom.reset();

        Task::perform(self.client.clone().fetch_image(url.clone()), move |result| {
            Message::HiResLoaded(url.clone(), result.map_err(Arc::new))
        })
    }

    fn hi_res_loaded(&mut self, url: &str, result: Result<LoadedImage, Arc<FetchError>>) {
        // the modal may have moved on to another photo
        let Some(viewer) = self.viewer.as_mut().filter(|v| v.photo.hi_res_url == url) else {
            return;
        };
        viewer.loading = false;

        match result {
            Ok(loaded) => {
                info!("🖼️  Loaded {} ({}x{})", url, loaded.width, loaded.height);
                viewer.image = Some(OpenImage {
                    handle: image::Handle::from_bytes(loaded.bytes),
                    natural: vec2(loaded.width as f32, loaded.height as f32),
                });
                self.zoom.show(url);
            }
            Err(e) => {
                warn!("⚠️  Hi-res image failed: {}", e);
                self.viewer = None;
            }
        }
    }

    fn viewer_event(&mut self, event: ViewerEvent) {
        let Some(natural) = self.viewer.as_ref().and_then(|v| v.image.as_ref()).map(|i| i.natural) else {
            return;
        };

        match event {
            ViewerEvent::Scrolled { delta_y, cursor, viewport } => {
                self.zoom.on_scroll(delta_y, cursor, viewport);
            }
            ViewerEvent::DragStarted(cursor) => {
                self.zoom.on_drag_start(cursor);
            }
            ViewerEvent::DragMoved { cursor, viewport } => {
                self.zoom.on_drag_move(cursor, natural, viewport);
            }
            ViewerEvent::DragEnded => self.zoom.on_drag_end(),
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let base = row![
            ui::sidebar::view(&self.gallery),
            ui::grid::view(&self.gallery, &self.thumbnails),
        ];

        match &self.viewer {
            Some(viewer) => stack![base, self.modal(viewer)].into(),
            None => base.into(),
        }
    }

    /// Hi-res modal over a dimmed backdrop; clicking the backdrop closes it
    fn modal<'a>(&'a self, viewer: &'a Viewer) -> Element<'a, Message> {
        let body: Element<Message> = match (&viewer.image, viewer.loading) {
            (_, true) => center(text("Loading image...").size(18)).into(),
            (Some(open), false) => canvas(ZoomableImage {
                handle: &open.handle,
                natural: open.natural,
                transform: &self.zoom,
            })
            .width(Length::Fill)
            .height(Length::Fill)
            .into(),
            (None, false) => center(text("")).into(),
        };

        let panel = container(
            column![
                row![
                    text(viewer.photo.id.as_str()).size(14),
                    horizontal_space(),
                    button(text("More like this"))
                        .on_press(Message::MoreLikeThis)
                        .style(button::primary),
                    button(text("Close"))
                        .on_press(Message::CloseViewer)
                        .style(button::secondary),
                ]
                .spacing(8),
                body,
            ]
            .spacing(8),
        )
        .padding(12)
        .width(Length::Fill)
        .height(Length::Fill)
        .style(container::rounded_box);

        let backdrop = center(opaque(panel))
            .padding(40)
            .style(|_theme: &Theme| container::Style {
                background: Some(Color { a: 0.55, ..Color::BLACK }.into()),
                ..container::Style::default()
            });

        opaque(mouse_area(backdrop).on_press(Message::CloseViewer))
    }

    fn subscription(&self) -> Subscription<Message> {
        keyboard::on_key_press(|key, _modifiers| match key {
            keyboard::Key::Named(keyboard::key::Named::Escape) => Some(Message::CloseViewer),
            _ => None,
        })
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load();
    let client = match ApiClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            error!("❌ Could not create HTTP client: {}", e);
            return Ok(());
        }
    };

    iced::application("Track Photo Viewer", TrackPhotoViewer::update, TrackPhotoViewer::view)
        .theme(TrackPhotoViewer::theme)
        .subscription(TrackPhotoViewer::subscription)
        .centered()
        .run_with(move || TrackPhotoViewer::new(config, client))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(id: &str) -> Photo {
        Photo {
            id: id.to_string(),
            thumbnail_url: format!("https://img/{id}_t.jpg"),
            hi_res_url: format!("https://img/{id}.jpg"),
            year: Some("2023".to_string()),
            event: Some("F1".to_string()),
            day: Some("FRI".to_string()),
            team: Some("Red".to_string()),
            misc: None,
        }
    }

    fn app() -> TrackPhotoViewer {
        let client = ApiClient::new(&Config::default()).unwrap();
        TrackPhotoViewer {
            gallery: Gallery::new(500),
            client,
            thumbnails: ThumbnailCache::default(),
            viewer: None,
            zoom: ZoomPanTransform::new(),
        }
    }

    fn loaded() -> Result<LoadedImage, Arc<FetchError>> {
        Ok(LoadedImage {
            bytes: vec![0u8; 16],
            width: 1200,
            height: 900,
        })
    }

    fn zoom_in(app: &mut TrackPhotoViewer) {
        app.viewer_event(ViewerEvent::Scrolled {
            delta_y: -1.0,
            cursor: vec2(700.0, 100.0),
            viewport: vec2(800.0, 600.0),
        });
    }

    #[test]
    fn test_reopening_photo_starts_unzoomed() {
        let mut app = app();
        let _ = app.open(photo("a"));
        app.hi_res_loaded("https://img/a.jpg", loaded());
        zoom_in(&mut app);
        assert!(app.zoom.scale() > ui::zoom::MIN_SCALE);

        let _ = app.update(Message::CloseViewer);
        let _ = app.open(photo("a"));
        assert_eq!(app.zoom.scale(), ui::zoom::MIN_SCALE);

        app.hi_res_loaded("https://img/a.jpg", loaded());
        assert_eq!(app.zoom.scale(), ui::zoom::MIN_SCALE);
        assert_eq!(app.zoom.translate(), vec2(0.0, 0.0));
    }

    #[test]
    fn test_failed_hi_res_closes_viewer() {
        let mut app = app();
        let _ = app.open(photo("a"));
        assert!(app.viewer.as_ref().is_some_and(|v| v.loading));

        let error = FetchError::Status {
            endpoint: "image",
            status: reqwest::StatusCode::NOT_FOUND,
        };
        app.hi_res_loaded("https://img/a.jpg", Err(Arc::new(error)));

        assert!(app.viewer.is_none());
    }

    #[test]
    fn test_late_hi_res_for_other_photo_is_ignored() {
        let mut app = app();
        let _ = app.open(photo("b"));
        app.hi_res_loaded("https://img/a.jpg", loaded());

        let viewer = app.viewer.as_ref().unwrap();
        assert!(viewer.loading);
        assert!(viewer.image.is_none());
    }
}
