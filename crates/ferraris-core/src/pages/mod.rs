//! Request routing and page rendering
//!
//! The meter serves a closed set of pages, each a pure read of the meter
//! state. Paths are matched exactly; the `.htm` forms are the ones the index
//! page links to.
//!
//! | Path                 | Page                                  |
//! |----------------------|---------------------------------------|
//! | `/`                  | Index frameset linking the other pages |
//! | `/wlcm`, `/wlcm.htm` | Welcome text                          |
//! | `/now`, `/now.htm`   | Instantaneous usage in watts          |
//! | `/min0`, `/min0.htm` | Rotations for history slots 0-59      |
//! | `/min1`, `/min1.htm` | Rotations for history slots 60-119    |
//!
//! Unknown paths get `401 Unauthorized`; methods other than GET are
//! acknowledged with a bare `200 OK`.

mod request;
mod response;

pub use request::{Method, Request, RequestError};
pub use response::{Response, Status};

use alloc::string::String;
use core::fmt::Write;

use crate::app_state::MeterView;
use crate::storage::HistoryWindow;

const PAGE_HEAD: &str = "<!DOCTYPE html>\n<html>\n<body>\n<pre>\n";
const PAGE_TAIL: &str = "</pre>\n</body>\n</html>";

const INDEX_BODY: &str = "<!DOCTYPE html>\n<html>\n<body>\n\
<a href=\"wlcm.htm\" target=\"data\">Welcome</a><br>\n\
<a href=\"now.htm\" target=\"data\">Current</a>\n<br>\n\
<a href=\"min0.htm\" target=\"data\">Minutes 0-59</a>\n<br>\n\
<a href=\"min1.htm\" target=\"data\">Minutes 60-119</a>\n\
<iframe src=\"wlcm.htm\" name=\"data\" style=\"border-color: #0000FF; border: 1; position:absolute; top:10; left:150px; right:0; bottom:10; width:600px; height:95%\"></iframe>\n\
</body>\n</html>";

const WELCOME_BODY: &str = concat!(
    "<!DOCTYPE html>\n<html>\n<body>\n<p>Welcome to ferraris v",
    env!("CARGO_PKG_VERSION"),
    "</p>\n<p>Select what data to see on the left</p>\n</body>\n</html>\n"
);

const ACK_BODY: &str = "<h1>200 OK</h1>";
const REJECT_BODY: &str = "<h1>401 Unauthorized</h1>";

/// Pages the meter can render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageId {
    Index,
    Welcome,
    Now,
    Minutes(HistoryWindow),
}

impl PageId {
    pub fn from_path(path: &str) -> Option<Self> {
        match path {
            "/" => Some(Self::Index),
            "/wlcm" | "/wlcm.htm" => Some(Self::Welcome),
            "/now" | "/now.htm" => Some(Self::Now),
            "/min0" | "/min0.htm" => Some(Self::Minutes(HistoryWindow::First)),
            "/min1" | "/min1.htm" => Some(Self::Minutes(HistoryWindow::Second)),
            _ => None,
        }
    }

    /// Render the page body, reading the meter only for the data pages
    pub fn render<M: MeterView + ?Sized>(self, meter: &M) -> String {
        match self {
            Self::Index => String::from(INDEX_BODY),
            Self::Welcome => String::from(WELCOME_BODY),
            Self::Now => render_usage(meter.current_usage()),
            Self::Minutes(window) => render_minutes(window, &meter.window(window)),
        }
    }
}

/// How the router disposes of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Page(PageId),
    /// Non-GET request, acknowledged without content
    Acknowledge,
    Unrecognized,
}

impl Route {
    pub fn resolve(request: &Request<'_>) -> Self {
        if request.method != Method::Get {
            return Self::Acknowledge;
        }
        PageId::from_path(request.path).map_or(Self::Unrecognized, Self::Page)
    }
}

/// Build the response for `request` against `meter`
pub fn respond<M: MeterView + ?Sized>(request: &Request<'_>, meter: &M) -> Response {
    match Route::resolve(request) {
        Route::Page(page) => Response::new(Status::Ok, page.render(meter)),
        Route::Acknowledge => Response::new(Status::Ok, String::from(ACK_BODY)),
        Route::Unrecognized => reject(),
    }
}

/// Parse raw request bytes and build the response
///
/// A request line that can't be parsed is rejected like an unknown path.
pub fn handle<M: MeterView + ?Sized>(raw: &[u8], meter: &M) -> Response {
    match Request::parse(raw) {
        Ok(request) => respond(&request, meter),
        Err(_) => reject(),
    }
}

fn reject() -> Response {
    Response::new(Status::Unauthorized, String::from(REJECT_BODY))
}

fn render_usage(watts: u32) -> String {
    let mut body = String::with_capacity(PAGE_HEAD.len() + PAGE_TAIL.len() + 10);
    body.push_str(PAGE_HEAD);
    let _ = write!(body, "{}", watts);
    body.push_str(PAGE_TAIL);
    body
}

fn render_minutes(window: HistoryWindow, counts: &[u16]) -> String {
    let mut body = String::with_capacity(PAGE_HEAD.len() + PAGE_TAIL.len() + counts.len() * 10);
    body.push_str(PAGE_HEAD);
    for (offset, count) in counts.iter().enumerate() {
        let _ = write!(body, "\n#{}:{}", window.start() + offset, count);
    }
    body.push_str(PAGE_TAIL);
    body
}
