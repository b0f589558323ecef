pub mod app;
pub mod file;
pub mod user;
pub mod user_session;

use rocket::{Build, Rocket};

pub fn register_routes(rocket: Rocket<Build>) -> Rocket<Build> {
    let rocket = app::controllers::register_routes(rocket);
    let rocket = user::controllers::register_routes(rocket);
    let rocket = user_session::controllers::register_routes(rocket);
    let rocket = file::controllers::register_routes(rocket);
    rocket
}
