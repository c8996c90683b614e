use axum::response::Html;
use serde_json::{Map, Value};

/// Renders the page shell for `view`.
///
/// Page scripts under `/static/scripts` do the drawing; the shell only hands
/// them the session contents as `window.session`.
pub fn render(view: &str, session: &Map<String, Value>) -> Html<String> {
    let state = serde_json::to_string(session)
        .unwrap_or_else(|_| "{}".to_owned())
        .replace('<', "\\u003c");

    Html(format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <title>{view}</title>\n\
         <script src=\"/static/js/tools.js\"></script>\n\
         </head>\n\
         <body data-view=\"{view}\">\n\
         <script>window.session = {state};</script>\n\
         <script src=\"/static/scripts/{view}.js\"></script>\n\
         </body>\n\
         </html>\n"
    ))
}
