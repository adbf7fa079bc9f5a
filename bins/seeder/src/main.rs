//! Database seeder for Faktura development and testing.
//!
//! Seeds the user role reference data (ADMIN, CLIENT) and a development
//! user for local development and testing purposes.
//!
//! Usage: cargo run --bin seeder

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use faktura_db::entities::{user_roles, users};

/// Admin role ID (consistent for all seeds)
const ADMIN_ROLE_ID: &str = "00000000-0000-0000-0000-000000000001";
/// Client role ID (consistent for all seeds)
const CLIENT_ROLE_ID: &str = "00000000-0000-0000-0000-000000000002";
/// Development user ID (consistent for all seeds)
const DEV_USER_ID: &str = "00000000-0000-0000-0000-000000000003";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = faktura_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    println!("Seeding user roles...");
    seed_user_roles(&db).await;

    println!("Seeding development user...");
    seed_dev_user(&db).await;

    println!("Seeding complete!");
}

fn admin_role_id() -> Uuid {
    Uuid::parse_str(ADMIN_ROLE_ID).unwrap()
}

fn client_role_id() -> Uuid {
    Uuid::parse_str(CLIENT_ROLE_ID).unwrap()
}

fn dev_user_id() -> Uuid {
    Uuid::parse_str(DEV_USER_ID).unwrap()
}

/// Seeds the role reference data. Roles are immutable once created.
async fn seed_user_roles(db: &DatabaseConnection) {
    let roles = [
        (
            admin_role_id(),
            "ADMIN",
            "Full access, including the user directory in global search",
        ),
        (
            client_role_id(),
            "CLIENT",
            "Standard tenant access to own records",
        ),
    ];

    for (id, name, description) in roles {
        let existing = user_roles::Entity::find()
            .filter(user_roles::Column::Name.eq(name))
            .one(db)
            .await
            .ok()
            .flatten();

        if existing.is_some() {
            println!("  Role {name} already exists, skipping...");
            continue;
        }

        let role = user_roles::ActiveModel {
            id: Set(id),
            name: Set(name.to_string()),
            description: Set(Some(description.to_string())),
        };

        if let Err(e) = role.insert(db).await {
            eprintln!("Failed to insert role {name}: {e}");
        } else {
            println!("  Created role: {name}");
        }
    }
}

/// Seeds a development user with the ADMIN role.
async fn seed_dev_user(db: &DatabaseConnection) {
    if users::Entity::find_by_id(dev_user_id())
        .one(db)
        .await
        .ok()
        .flatten()
        .is_some()
    {
        println!("  Development user already exists, skipping...");
        return;
    }

    let user = users::ActiveModel {
        id: Set(dev_user_id()),
        email: Set("dev@faktura.dev".to_string()),
        first_name: Set("Dev".to_string()),
        last_name: Set("User".to_string()),
        provider_uid: Set("dev-provider-uid".to_string()),
        role_id: Set(Some(admin_role_id())),
        last_login: Set(None),
        created_at: Set(Utc::now().into()),
    };

    if let Err(e) = user.insert(db).await {
        eprintln!("Failed to insert development user: {e}");
    } else {
        println!("  Created development user: dev@faktura.dev");
    }
}
