use crate::{
    auth::{
        generate_token, hash_password, verify_password, AuthResponse, AuthenticatedUserId,
        LoginRequest, RegisterRequest,
    },
    error::AppError,
    models::{ProfileUpdate, UserProfile},
};
use actix_web::{get, post, put, web, HttpResponse, Responder};
use sqlx::PgPool;
use validator::Validate;

/// Register a new user
///
/// Creates a new account and returns an authentication token. Username and
/// email must both be unused.
#[post("/register")]
pub async fn register(
    pool: web::Data<PgPool>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;

    let existing_username =
        sqlx::query_as::<_, (i32,)>("SELECT id FROM users WHERE username = $1")
            .bind(&register_data.username)
            .fetch_optional(&**pool)
            .await?;

    if existing_username.is_some() {
        return Err(AppError::BadRequest(
            "Username already exists. Please choose a different username".into(),
        ));
    }

    let existing_email = sqlx::query_as::<_, (i32,)>("SELECT id FROM users WHERE email = $1")
        .bind(&register_data.email)
        .fetch_optional(&**pool)
        .await?;

    if existing_email.is_some() {
        return Err(AppError::BadRequest(
            "Email already registered. Please use a different email or try logging in".into(),
        ));
    }

    let password_hash = hash_password(&register_data.password)?;

    let (user_id,): (i32,) = sqlx::query_as(
        "INSERT INTO users (username, email, password_hash, first_name, last_name) \
         VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(&register_data.username)
    .bind(&register_data.email)
    .bind(&password_hash)
    .bind(&register_data.first_name)
    .bind(&register_data.last_name)
    .fetch_one(&**pool)
    .await?;

    let token = generate_token(user_id)?;

    log::info!("new user registered: {}", register_data.username);

    Ok(HttpResponse::Created().json(AuthResponse { token, user_id }))
}

/// Login user
///
/// Authenticates by email and password and returns an authentication token.
/// Unknown email and wrong password produce the same response.
#[post("/login")]
pub async fn login(
    pool: web::Data<PgPool>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let user = sqlx::query_as::<_, (i32, String)>(
        "SELECT id, password_hash FROM users WHERE email = $1",
    )
    .bind(&login_data.email)
    .fetch_optional(&**pool)
    .await?;

    match user {
        Some((user_id, password_hash)) => {
            if verify_password(&login_data.password, &password_hash)? {
                let token = generate_token(user_id)?;
                log::info!("user {} logged in", user_id);
                Ok(HttpResponse::Ok().json(AuthResponse { token, user_id }))
            } else {
                Err(AppError::Unauthorized("Invalid credentials".into()))
            }
        }
        None => Err(AppError::Unauthorized("Invalid credentials".into())),
    }
}

/// Get current user's profile
///
/// Includes the number of tasks the account owns.
#[get("/profile")]
pub async fn get_profile(
    pool: web::Data<PgPool>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let profile = sqlx::query_as::<_, UserProfile>(
        "SELECT u.id, u.username, u.email, u.first_name, u.last_name, \
                (SELECT COUNT(*) FROM tasks t WHERE t.user_id = u.id) AS task_count \
         FROM users u WHERE u.id = $1",
    )
    .bind(user.0)
    .fetch_optional(&**pool)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(HttpResponse::Ok().json(profile))
}

/// Update current user's profile
///
/// Accepts any subset of email, first name and last name; omitted fields
/// keep their stored values.
#[put("/profile")]
pub async fn update_profile(
    pool: web::Data<PgPool>,
    profile_data: web::Json<ProfileUpdate>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    profile_data.validate()?;

    let profile = sqlx::query_as::<_, UserProfile>(
        "UPDATE users u \
         SET email = COALESCE($1, email), \
             first_name = COALESCE($2, first_name), \
             last_name = COALESCE($3, last_name) \
         WHERE id = $4 \
         RETURNING u.id, u.username, u.email, u.first_name, u.last_name, \
                   (SELECT COUNT(*) FROM tasks t WHERE t.user_id = u.id) AS task_count",
    )
    .bind(&profile_data.email)
    .bind(&profile_data.first_name)
    .bind(&profile_data.last_name)
    .bind(user.0)
    .fetch_optional(&**pool)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    log::info!("profile updated for user {}", user.0);

    Ok(HttpResponse::Ok().json(profile))
}
