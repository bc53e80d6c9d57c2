//! One template function per section variant.
//!
//! Editable output binds every field to an `<input>`/`<textarea>` annotated
//! with `data-field` (and `data-item` for list entries); read-only output is
//! the same structure minus the controls.

use crate::document::model::{
    ExperienceItem, FaqItem, GalleryItem, ListContent, ProjectItem, SectionItem, SkillItem,
    TestimonialItem, TextContent,
};
use crate::render::{escape_html, RenderMode};

fn text_input(field: &str, value: &str) -> String {
    format!(
        "<input data-field=\"{field}\" value=\"{}\">",
        escape_html(value)
    )
}

fn text_area(field: &str, value: &str) -> String {
    format!(
        "<textarea data-field=\"{field}\">{}</textarea>",
        escape_html(value)
    )
}

fn item_input(item_id: &str, field: &str, value: &str) -> String {
    format!(
        "<input data-item=\"{}\" data-field=\"{field}\" value=\"{}\">",
        escape_html(item_id),
        escape_html(value)
    )
}

fn title_line(title: &str, mode: RenderMode) -> String {
    match mode {
        RenderMode::Editable => format!("<h2>{}</h2>\n", text_input("title", title)),
        RenderMode::ReadOnly => {
            if title.trim().is_empty() {
                String::new()
            } else {
                format!("<h2>{}</h2>\n", escape_html(title))
            }
        }
    }
}

fn field_line(item_id: &str, field: &str, value: &str, mode: RenderMode) -> String {
    match mode {
        RenderMode::Editable => format!(
            "<span class=\"{field}\">{}</span>",
            item_input(item_id, field, value)
        ),
        RenderMode::ReadOnly => {
            if value.trim().is_empty() {
                String::new()
            } else {
                format!("<span class=\"{field}\">{}</span>", escape_html(value))
            }
        }
    }
}

pub fn header(_id: &str, t: &TextContent, mode: RenderMode) -> String {
    match mode {
        RenderMode::Editable => format!(
            "<h1>{}</h1>\n<p class=\"tagline\">{}</p>\n",
            text_input("title", &t.title),
            text_input("body", &t.body)
        ),
        RenderMode::ReadOnly => format!(
            "<h1>{}</h1>\n<p class=\"tagline\">{}</p>\n",
            escape_html(&t.title),
            escape_html(&t.body)
        ),
    }
}

pub fn summary(_id: &str, t: &TextContent, mode: RenderMode) -> String {
    match mode {
        RenderMode::Editable => format!(
            "{}<p>{}</p>\n",
            title_line(&t.title, mode),
            text_area("body", &t.body)
        ),
        RenderMode::ReadOnly => format!(
            "{}<p>{}</p>\n",
            title_line(&t.title, mode),
            escape_html(&t.body)
        ),
    }
}

fn item_list<T: SectionItem>(
    content: &ListContent<T>,
    mode: RenderMode,
    mut render_item: impl FnMut(&T, RenderMode) -> String,
) -> String {
    let mut out = title_line(&content.title, mode);
    out.push_str("<ul>\n");
    for item in &content.items {
        out.push_str(&format!(
            "<li data-item=\"{}\">{}</li>\n",
            escape_html(item.id()),
            render_item(item, mode)
        ));
    }
    out.push_str("</ul>\n");
    out
}

pub fn experience(_id: &str, c: &ListContent<ExperienceItem>, mode: RenderMode) -> String {
    item_list(c, mode, |item, mode| {
        format!(
            "{} {} {}–{}<div class=\"description\">{}</div>",
            field_line(&item.id, "role", &item.role, mode),
            field_line(&item.id, "company", &item.company, mode),
            field_line(&item.id, "date_start", &item.date_start, mode),
            field_line(&item.id, "date_end", &item.date_end, mode),
            match mode {
                RenderMode::Editable => item_input(&item.id, "description", &item.description),
                RenderMode::ReadOnly => escape_html(&item.description),
            }
        )
    })
}

pub fn projects(_id: &str, c: &ListContent<ProjectItem>, mode: RenderMode) -> String {
    item_list(c, mode, |item, mode| {
        let image = if item.image.is_empty() {
            String::new()
        } else {
            format!("<img src=\"{}\" alt=\"\">", escape_html(&item.image))
        };
        format!(
            "{}{} {}<div class=\"description\">{}</div>",
            image,
            field_line(&item.id, "title", &item.title, mode),
            field_line(&item.id, "link", &item.link, mode),
            match mode {
                RenderMode::Editable => item_input(&item.id, "description", &item.description),
                RenderMode::ReadOnly => escape_html(&item.description),
            }
        )
    })
}

pub fn skills(_id: &str, c: &ListContent<SkillItem>, mode: RenderMode) -> String {
    item_list(c, mode, |item, mode| {
        format!(
            "{} {}",
            field_line(&item.id, "name", &item.name, mode),
            field_line(&item.id, "level", &item.level, mode)
        )
    })
}

pub fn testimonials(_id: &str, c: &ListContent<TestimonialItem>, mode: RenderMode) -> String {
    item_list(c, mode, |item, mode| {
        format!(
            "<blockquote>{}</blockquote><cite>{} {}</cite>",
            match mode {
                RenderMode::Editable => item_input(&item.id, "quote", &item.quote),
                RenderMode::ReadOnly => escape_html(&item.quote),
            },
            field_line(&item.id, "author", &item.author, mode),
            field_line(&item.id, "role", &item.role, mode)
        )
    })
}

pub fn gallery(_id: &str, c: &ListContent<GalleryItem>, mode: RenderMode) -> String {
    item_list(c, mode, |item, mode| {
        let image = if item.image.is_empty() {
            String::new()
        } else {
            format!(
                "<img src=\"{}\" alt=\"{}\">",
                escape_html(&item.image),
                escape_html(&item.caption)
            )
        };
        format!(
            "{image}<figcaption>{}</figcaption>",
            field_line(&item.id, "caption", &item.caption, mode)
        )
    })
}

pub fn faq(_id: &str, c: &ListContent<FaqItem>, mode: RenderMode) -> String {
    item_list(c, mode, |item, mode| {
        format!(
            "<dt>{}</dt><dd>{}</dd>",
            field_line(&item.id, "question", &item.question, mode),
            match mode {
                RenderMode::Editable => item_input(&item.id, "answer", &item.answer),
                RenderMode::ReadOnly => escape_html(&item.answer),
            }
        )
    })
}

pub fn line_break() -> String {
    "<hr>\n".to_string()
}
