//! services/api/src/bin/seed.rs
//!
//! Populates the configured store with demo data: 10 users and 20 courses,
//! each course with a small catalog, and every other course with one to
//! three enrolled students. The data is deterministic, and the run is
//! skipped when the store already holds users.

use std::sync::Arc;

use api_lib::{config::Config, error::ApiError, storage::Storage};
use course_enrollment_core::domain::{Class, NewComment, NewCourse, NewUser, Unit, User};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USERS: usize = 10;
const COURSES: usize = 20;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let storage = Storage::connect(&config.storage).await?;
    let state = storage.app_state(config.clone());

    if !state.users.list_users().await?.is_empty() {
        warn!("Store already holds users; nothing seeded.");
        storage.close().await;
        return Ok(());
    }

    // --- 1. Users ---
    let mut users: Vec<User> = Vec::with_capacity(USERS);
    for i in 1..=USERS {
        let user = state
            .users
            .create_user(NewUser {
                name: format!("User {}", i),
                email: format!("user{}@example.com", i),
                password: format!("password{}", i),
            })
            .await?;
        users.push(user);
    }
    info!("{} users saved", users.len());

    // --- 2. Courses, ratings and a comment each ---
    for i in 1..=COURSES {
        let creator = &users[(i * 7) % USERS];
        let course = state
            .courses
            .create_course(demo_course(i), &creator.id)
            .await?;

        for r in 0..(i % 4) {
            let value = ((i + r) % 5 + 1) as f64;
            state.courses.rate_course(&course.id, value).await?;
        }
        state
            .courses
            .add_comment(
                &course.id,
                NewComment {
                    author: creator.name.clone(),
                    title: format!("Welcome to Course {}", i),
                    detail: "Questions are welcome here.".to_string(),
                },
            )
            .await?;

        // --- 3. Enrollments on every other course ---
        if i % 2 == 0 {
            let students = i % 3 + 1;
            for j in 0..students {
                let student = &users[(i + j * 3) % USERS];
                state.courses.enroll(&student.id, &course.id).await?;
            }
            let first = &users[i % USERS];
            state
                .courses
                .mark_class_viewed(&course.id, &first.id, "unit-1", "class-1")
                .await?;
        }
    }
    info!("{} courses saved", COURSES);

    storage.close().await;
    info!("Seeding finished");
    Ok(())
}

/// Course `i`: two units with two classes each.
fn demo_course(i: usize) -> NewCourse {
    let units = (1..=2)
        .map(|u| Unit {
            unit_id: format!("unit-{}", u),
            name: format!("Unit {} of Course {}", u, i),
            classes: (1..=2)
                .map(|c| Class {
                    class_id: format!("class-{}", c),
                    name: format!("Class {}.{}", u, c),
                })
                .collect(),
        })
        .collect();

    NewCourse {
        name: format!("Course {}", i),
        short_description: format!("Short description for Course {}", i),
        banner_image: format!("bannerImage{}.png", i),
        main_image: format!("mainImage{}.png", i),
        units,
        ..NewCourse::default()
    }
}
