use utoipa::OpenApi;

use crate::routes;

#[derive(OpenApi)]
#[openapi(
    paths(routes::homepage, routes::health, routes::register_student),
    components(schemas(routes::RegisterStudentForm)),
    tags(
        (name = "tickets", description = "Student registration and ticket generation")
    )
)]
pub struct ApiDoc;
