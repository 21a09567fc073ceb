//! Seed data script - populates the database with demo data
//!
//! Run with: cargo run --bin seed-data
//!
//! This creates:
//! - 2 back-office users
//! - a small catalog of frames, glass types and lenses
//! - 5 orders opened through the tunnel, each with a prescription and product
//! - 2 vouchers, one settled and one with an outstanding balance

use std::sync::Arc;

use anyhow::Context;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::info;

use optica_api::{
    config, db,
    entities::{
        glass_type::{Distance, Treatment},
        voucher::PaymentMethod,
    },
    services::{
        catalog::{CatalogService, FrameInput, GlassTypeInput, LensInput},
        order_details::{
            ContactInput, EyeMeasurements, IdentityInput, InstitutionInput, PrescriptionInput,
            VisionMeasurements,
        },
        tunnel::{CatalogChoice, TunnelProductInput, TunnelService, TunnelSubmission},
        users::{CreateUserInput, UserService},
        vouchers::{CreateVoucherInput, VoucherLineInput, VoucherService},
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::load_config().context("failed to load configuration")?;
    config::init_tracing(cfg.log_level(), cfg.log_json);

    info!("=== Optica API Seed Data ===");

    let pool = db::establish_connection_from_app_config(&cfg)
        .await
        .context("failed to connect to the database")?;
    db::run_migrations(&pool).await?;
    let pool = Arc::new(pool);

    let users = UserService::new(pool.clone());
    let catalog = CatalogService::new(pool.clone());
    let tunnel = TunnelService::new(pool.clone());
    let vouchers = VoucherService::new(pool);

    info!("Creating users...");
    let frontdesk = users
        .create_user(CreateUserInput {
            username: "frontdesk".to_string(),
            email: Some("frontdesk@optica.example".to_string()),
        })
        .await?;
    users
        .create_user(CreateUserInput {
            username: "optometrist".to_string(),
            email: None,
        })
        .await?;

    info!("Creating catalog...");
    let mut frame_ids = Vec::new();
    for title in ["Ray-Ban Aviator", "Oakley Holbrook", "Lindberg Air Titanium"] {
        let frame = catalog
            .create_frame(FrameInput {
                title: title.to_string(),
            })
            .await?;
        frame_ids.push(frame.id);
    }

    let mut glass_type_ids = Vec::new();
    for (distance, treatment) in [
        (Distance::Far, Some(Treatment::AntiReflective)),
        (Distance::Near, None),
        (Distance::Medium, Some(Treatment::UvProtection)),
    ] {
        let glass_type = catalog
            .create_glass_type(GlassTypeInput {
                distance,
                treatment,
            })
            .await?;
        glass_type_ids.push(glass_type.id);
    }

    let mut lens_ids = Vec::new();
    for title in ["Single vision 1.5 index", "Progressive 1.67 index"] {
        let lens = catalog
            .create_lens(LensInput {
                title: title.to_string(),
            })
            .await?;
        lens_ids.push(lens.id);
    }

    info!("Opening orders...");
    let customers = [
        ("Ana", "Popescu", "+40712345678", dec!(300.00)),
        ("Mihai", "Ionescu", "+40723456789", dec!(180.00)),
        ("Elena", "Dumitru", "", dec!(450.50)),
        ("Andrei", "Stan", "+40734567890", dec!(220.00)),
        ("Ioana", "Marin", "+40745678901", dec!(95.00)),
    ];

    let mut order_ids = Vec::new();
    for (i, (first_name, last_name, phone, price)) in customers.into_iter().enumerate() {
        let receipt = tunnel
            .submit(TunnelSubmission {
                user_id: frontdesk.id,
                identity: IdentityInput {
                    first_name: first_name.to_string(),
                    last_name: last_name.to_string(),
                },
                contact: ContactInput {
                    phone_number: phone.to_string(),
                },
                institution: InstitutionInput {
                    title: "City Hospital Ophthalmology".to_string(),
                    address: format!("{} Main Street", 10 + i),
                },
                prescription: prescription(i),
                product: TunnelProductInput {
                    frame: CatalogChoice::Existing {
                        id: frame_ids[i % frame_ids.len()],
                    },
                    glass_type: CatalogChoice::Existing {
                        id: glass_type_ids[i % glass_type_ids.len()],
                    },
                    lens: CatalogChoice::Existing {
                        id: lens_ids[i % lens_ids.len()],
                    },
                    price,
                },
            })
            .await?;
        info!("  {} for {} {}", receipt.reference, first_name, last_name);
        order_ids.push(receipt.order_id);
    }

    info!("Creating vouchers...");
    let settled = vouchers
        .create_voucher(CreateVoucherInput {
            payment_method: PaymentMethod::Card,
            order_ids: vec![order_ids[0]],
        })
        .await?;
    vouchers
        .add_line(settled.id, line(dec!(300.00), 3))
        .await?;

    let open = vouchers
        .create_voucher(CreateVoucherInput {
            payment_method: PaymentMethod::Igc,
            order_ids: vec![order_ids[1], order_ids[2]],
        })
        .await?;
    vouchers.add_line(open.id, line(dec!(150.00), 2)).await?;
    vouchers.add_line(open.id, line(dec!(100.00), 1)).await?;
    let balance = vouchers.balance(open.id).await?;
    info!("  Voucher {} has {} left to pay", open.id, balance.rest_amount);

    info!("=== Seed Data Complete ===");
    info!("Try these API calls:");
    info!("  curl http://localhost:8080/api/v1/orders");
    info!("  curl http://localhost:8080/api/v1/vouchers");
    info!("Or explore interactively at: http://localhost:8080/swagger-ui");

    Ok(())
}

fn prescription(seed: usize) -> PrescriptionInput {
    let step = Decimal::from(seed as i64) * dec!(0.25);
    let far = VisionMeasurements {
        od: EyeMeasurements {
            spheric: Some(dec!(-1.00) - step),
            cylindric: Some(dec!(0.50)),
            axis: Some(90),
        },
        os: EyeMeasurements {
            spheric: Some(dec!(-0.75) - step),
            cylindric: None,
            axis: Some(85),
        },
        pupillary_distance: Some(dec!(62.5)),
    };
    PrescriptionInput {
        far,
        ..Default::default()
    }
}

fn line(amount: Decimal, days_ago: i64) -> VoucherLineInput {
    VoucherLineInput {
        amount,
        payment_date: (Utc::now() - Duration::days(days_ago)).date_naive(),
        payment_ref: Some(format!("SEED-{}", days_ago)),
    }
}
