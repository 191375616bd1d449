pub mod auth;
pub mod health;
pub mod tasks;

use actix_web::web;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(auth::login)
            .service(auth::register)
            .service(auth::get_profile)
            .service(auth::update_profile),
    )
    .service(
        web::scope("/tasks")
            // Literal paths must be registered before the `{id}` matchers,
            // or "stats" and "bulk-update" would be parsed as task ids.
            .service(tasks::get_task_stats)
            .service(tasks::bulk_update_tasks)
            .service(tasks::get_tasks)
            .service(tasks::create_task)
            .service(tasks::get_task)
            .service(tasks::update_task)
            .service(tasks::delete_task),
    );
}
