use handlebars::{Handlebars, TemplateError};
use std::sync::Arc;

pub type Hbs = Arc<Handlebars<'static>>;

macro_rules! template {
    ($name:literal) => {
        ($name, include_str!(concat!("../../templates/", $name, ".hbs")))
    };
}

const TEMPLATES: &[(&str, &str)] = &[
    // Layout + pages
    template!("layouts/base"),
    template!("pages/home"),
    template!("pages/not_found"),
    template!("pages/login"),
    template!("pages/register"),
    template!("pages/dashboard"),
    template!("pages/change_password"),
    template!("pages/change_password_done"),
    template!("pages/stock_list"),
    template!("pages/stock_detail"),
    template!("pages/stock_overview"),
    template!("pages/etf_list"),
    template!("pages/calendar"),
    template!("pages/news_feed"),
    template!("pages/integrations_list"),
    template!("pages/integration_form"),
];

const PARTIALS: &[(&str, &str)] = &[
    ("navbar", include_str!("../../templates/partials/navbar.hbs")),
    ("footer", include_str!("../../templates/partials/footer.hbs")),
    ("stock_table", include_str!("../../templates/partials/stock_table.hbs")),
    ("field_error", include_str!("../../templates/partials/field_error.hbs")),
];

pub fn build_handlebars() -> Result<Hbs, TemplateError> {
    let mut hb = Handlebars::new();

    for (name, src) in TEMPLATES {
        hb.register_template_string(name, *src)?;
    }
    for (name, src) in PARTIALS {
        hb.register_partial(name, *src)?;
    }

    Ok(Arc::new(hb))
}
