use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Method, Status};
use rocket::route::{Handler, Outcome};
use rocket::{Data, Request, Response, Route};

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type, Authorization";

/// Browsers may call the proxy from any origin.
///
/// As a fairing it stamps the headers on every response, as a route handler it
/// answers `OPTIONS` preflights.
#[derive(Clone)]
pub struct CORS;

impl CORS {
    /// Catch-all `OPTIONS` route, ranked below everything else
    pub fn preflight_route() -> Route {
        Route::ranked(isize::MAX, Method::Options, "/<preflight..>", CORS)
    }
}

#[rocket::async_trait]
impl Fairing for CORS {
    fn info(&self) -> Info {
        Info {
            name: "CORS headers",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _req: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", ALLOW_ORIGIN));
        response.set_header(Header::new("Access-Control-Allow-Methods", ALLOW_METHODS));
        response.set_header(Header::new("Access-Control-Allow-Headers", ALLOW_HEADERS));
    }
}

#[rocket::async_trait]
impl Handler for CORS {
    async fn handle<'r>(&self, _request: &'r Request<'_>, _data: Data<'r>) -> Outcome<'r> {
        let mut rsp = Response::new();
        rsp.set_status(Status::NoContent);
        Outcome::Success(rsp)
    }
}
