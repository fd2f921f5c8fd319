use crate::errors::ServerError;
use astra::{Body, Response, ResponseBuilder};
use maud::{html, DOCTYPE};
use serde_json::json;

pub type ResultResp = Result<Response, ServerError>;

/// Convert a ServerError into a JSON or HTML response, whichever the route speaks.
pub fn error_to_response(err: &ServerError, wants_json: bool) -> Response {
    let status = err.status();
    let message = err.to_string();
    if wants_json {
        json_error_response(status, &message)
    } else {
        html_error_response(status, &message)
    }
}

fn json_error_response(status: u16, message: &str) -> Response {
    let body = json!({ "error": message }).to_string();

    ResponseBuilder::new()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Body::from(body))
        .unwrap_or_else(|_| Response::new(Body::from("Internal Server Error")))
}

/// Build an HTML error page
pub fn html_error_response(status: u16, message: &str) -> Response {
    let page = html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { "Error " (status) }
            }
            body {
                h1 { "Error " (status) }
                p { (message) }
            }
        }
    };

    ResponseBuilder::new()
        .status(status)
        .header("Content-Type", "text/html; charset=utf-8")
        .body(Body::from(page.into_string()))
        .unwrap_or_else(|_| Response::new(Body::from("Internal Server Error")))
}
