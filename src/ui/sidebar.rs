use iced::widget::{button, column, container, horizontal_rule, row, scrollable, slider, text, Column};
use iced::{Alignment, Element, Length, Pixels};
use iced_aw::Wrap;

use crate::state::data::Facet;
use crate::state::gallery::Gallery;
use crate::state::resolver::Density;
use crate::Message;

const SIDEBAR_WIDTH: f32 = 280.0;

/// Filter controls, photo count and (in similarity mode) the density panel
pub fn view(gallery: &Gallery) -> Element<'_, Message> {
    let count = gallery.display().len();

    let mut content: Column<Message> = column![
        button(text("Clear All Filters"))
            .on_press(Message::ClearFilters)
            .style(button::danger)
            .width(Length::Fill)
            .padding(8),
        text(format!("{} photo{} filtered", count, if count == 1 { "" } else { "s" })).size(14),
    ]
    .spacing(12);

    if let Some(anchor) = gallery.anchor() {
        content = content.push(horizontal_rule(1)).push(similarity_panel(&anchor.id, gallery.density()));
    }

    for facet in Facet::ALL {
        let options = gallery.options().get(facet);
        if options.is_empty() {
            continue;
        }
        content = content.push(horizontal_rule(1)).push(facet_group(gallery, facet, options));
    }

    container(scrollable(content.padding(16)))
        .width(Length::Fixed(SIDEBAR_WIDTH))
        .height(Length::Fill)
        .style(container::bordered_box)
        .into()
}

/// One toggle button per option value, active ones highlighted
fn facet_group<'a>(gallery: &'a Gallery, facet: Facet, options: &'a [String]) -> Element<'a, Message> {
    let buttons: Vec<Element<'a, Message>> = options
        .iter()
        .map(|value| {
            let style = if gallery.selections().contains(facet, value) {
                button::primary
            } else {
                button::secondary
            };
            button(text(value.as_str()).size(13))
                .on_press(Message::Toggle(facet, value.clone()))
                .style(style)
                .padding([4, 10])
                .into()
        })
        .collect();

    column![
        text(facet.as_str()).size(16),
        Wrap::with_elements(buttons).spacing(Pixels(6.0)).line_spacing(Pixels(6.0)),
    ]
    .spacing(8)
    .into()
}

fn similarity_panel(anchor: &str, density: Density) -> Element<'_, Message> {
    column![
        text(format!("Similar to {}", anchor)).size(14),
        row![
            text("Density").size(13),
            slider(0..=Density::MAX, density.value(), Message::DensityChanged).step(1u8),
            text(format!("{}%", density.value())).size(13),
        ]
        .spacing(8)
        .align_y(Alignment::Center),
        button(text("Back to filters"))
            .on_press(Message::BackToFilters)
            .style(button::secondary)
            .width(Length::Fill),
    ]
    .spacing(10)
    .into()
}
