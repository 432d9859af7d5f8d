pub mod awards;
pub mod handlers;
pub mod personal_info;
pub mod store;

use axum::{
    routing::{get, post},
    Router,
};

use crate::models::sections::{
    Award, Certification, Education, Experience, Language, Project, Publication, Reference,
    Section, Skill, Volunteer,
};
use crate::state::AppState;

/// Mounts the full CRUD surface for one section type under
/// `/api/v1/resumes/:resume_id/{T::PATH}`.
fn section_routes<T: Section>(router: Router<AppState>) -> Router<AppState> {
    let base = format!("/api/v1/resumes/:resume_id/{}", T::PATH);
    router
        .route(
            &base,
            get(handlers::list_items::<T>).post(handlers::create_item::<T>),
        )
        .route(
            &format!("{base}/bulk-update"),
            post(handlers::bulk_update::<T>),
        )
        .route(
            &format!("{base}/reorder"),
            post(handlers::reorder_items::<T>),
        )
        .route(
            &format!("{base}/:item_id"),
            get(handlers::get_item::<T>)
                .put(handlers::update_item::<T>)
                .patch(handlers::patch_item::<T>)
                .delete(handlers::delete_item::<T>),
        )
}

pub fn routes() -> Router<AppState> {
    let router = Router::new()
        .route(
            "/api/v1/resumes/:resume_id/personal-info",
            get(personal_info::get_info)
                .put(personal_info::put_info)
                .patch(personal_info::patch_info),
        )
        .route(
            "/api/v1/resumes/:resume_id/awards/statistics",
            get(awards::statistics),
        )
        .route(
            "/api/v1/resumes/:resume_id/awards/:item_id/duplicate",
            post(awards::duplicate),
        );

    let mounts: [fn(Router<AppState>) -> Router<AppState>; 10] = [
        section_routes::<Experience>,
        section_routes::<Education>,
        section_routes::<Skill>,
        section_routes::<Project>,
        section_routes::<Certification>,
        section_routes::<Language>,
        section_routes::<Award>,
        section_routes::<Publication>,
        section_routes::<Volunteer>,
        section_routes::<Reference>,
    ];
    mounts
        .into_iter()
        .fold(router, |router, mount| mount(router))
}
