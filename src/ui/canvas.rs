use cgmath::{vec2, Vector2};
use iced::mouse::{self, Cursor};
use iced::widget::canvas::{self, Program};
use iced::widget::image;
use iced::{Point, Rectangle, Renderer, Size, Theme};

use super::zoom::ZoomPanTransform;
use crate::Message;

/// Pointer input for the hi-res viewer, in the units ZoomPanTransform expects
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewerEvent {
    /// Wheel turned; negative `delta_y` means zoom in
    Scrolled {
        delta_y: f32,
        cursor: Vector2<f32>,
        viewport: Vector2<f32>,
    },
    DragStarted(Vector2<f32>),
    DragMoved {
        cursor: Vector2<f32>,
        viewport: Vector2<f32>,
    },
    DragEnded,
}

/// Canvas program drawing one hi-res photo under the current zoom/pan
pub struct ZoomableImage<'a> {
    pub handle: &'a image::Handle,
    /// Natural size of the photo in pixels
    pub natural: Vector2<f32>,
    pub transform: &'a ZoomPanTransform,
}

impl ZoomableImage<'_> {
    /// Where the photo lands inside `viewport`: fitted at 1×, then scaled and
    /// offset around the centre
    fn placement(&self, viewport: Size) -> Rectangle {
        let fit = (viewport.width / self.natural.x)
            .min(viewport.height / self.natural.y)
            .min(1.0);
        let fit = if fit.is_finite() { fit } else { 1.0 };

        let scale = self.transform.scale();
        let size = self.natural * fit * scale;
        let offset = self.transform.translate();
        let centre = vec2(viewport.width, viewport.height) / 2.0 + offset;

        Rectangle {
            x: centre.x - size.x / 2.0,
            y: centre.y - size.y / 2.0,
            width: size.x,
            height: size.y,
        }
    }
}

impl Program<Message> for ZoomableImage<'_> {
    type State = DragState;

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());
        let target = self.placement(bounds.size());

        frame.with_clip(Rectangle::with_size(bounds.size()), |frame| {
            frame.draw_image(target, canvas::Image::new(self.handle.clone()));
        });

        vec![frame.into_geometry()]
    }

    fn update(
        &self,
        state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        let viewport = vec2(bounds.width, bounds.height);

        match event {
            // Zoom anchored at the cursor
            canvas::Event::Mouse(mouse::Event::WheelScrolled { delta }) => {
                let Some(position) = cursor.position_in(bounds) else {
                    return (canvas::event::Status::Ignored, None);
                };
                // iced reports wheel-up as positive
                let delta_y = match delta {
                    mouse::ScrollDelta::Lines { y, .. } | mouse::ScrollDelta::Pixels { y, .. } => -y,
                };
                if delta_y == 0.0 {
                    return (canvas::event::Status::Ignored, None);
                }
                let event = ViewerEvent::Scrolled {
                    delta_y,
                    cursor: to_vector(position),
                    viewport,
                };
                return (canvas::event::Status::Captured, Some(Message::Viewer(event)));
            }

            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                if let Some(position) = cursor.position_over(bounds) {
                    if self.transform.scale() > super::zoom::MIN_SCALE {
                        state.is_dragging = true;
                        let event = ViewerEvent::DragStarted(to_vector(position));
                        return (canvas::event::Status::Captured, Some(Message::Viewer(event)));
                    }
                }
            }

            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                if state.is_dragging {
                    state.is_dragging = false;
                    return (canvas::event::Status::Captured, Some(Message::Viewer(ViewerEvent::DragEnded)));
                }
            }

            // Pan; keeps tracking outside the bounds until release
            canvas::Event::Mouse(mouse::Event::CursorMoved { position }) => {
                if state.is_dragging {
                    let event = ViewerEvent::DragMoved {
                        cursor: to_vector(position),
                        viewport,
                    };
                    return (canvas::event::Status::Captured, Some(Message::Viewer(event)));
                }
            }

            _ => {}
        }

        (canvas::event::Status::Ignored, None)
    }

    fn mouse_interaction(&self, state: &Self::State, bounds: Rectangle, cursor: Cursor) -> mouse::Interaction {
        if state.is_dragging {
            mouse::Interaction::Grabbing
        } else if !cursor.is_over(bounds) {
            mouse::Interaction::default()
        } else if self.transform.scale() > super::zoom::MIN_SCALE {
            mouse::Interaction::Grab
        } else {
            mouse::Interaction::Pointer
        }
    }
}

/// State for drag interactions
#[derive(Debug, Clone, Default)]
pub struct DragState {
    pub is_dragging: bool,
}

fn to_vector(point: Point) -> Vector2<f32> {
    vec2(point.x, point.y)
}
