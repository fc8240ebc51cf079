use crate::cors::CORS;
use crate::settings::Settings;
use rocket::{catchers, Build, Catcher, Rocket, Route};

mod edge;
mod envelope;
mod model;
mod routes;

pub use envelope::{ApiData, ApiError, ApiResult};

pub fn routes() -> Vec<Route> {
    let mut r = routes::routes();
    r.append(&mut edge::routes());
    r
}

pub fn catchers() -> Vec<Catcher> {
    catchers![envelope::default_catcher]
}

/// Both http adapters on one server, ready to launch
pub fn rocket(settings: Settings, config: rocket::Config) -> Rocket<Build> {
    Rocket::custom(config)
        .manage(settings)
        .mount("/", routes())
        .register("/", catchers())
        .attach(CORS)
        .mount("/", vec![CORS::preflight_route()])
}
