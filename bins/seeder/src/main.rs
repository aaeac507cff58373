//! Demo data seeder for TMI development.
//!
//! Seeds one company with a move sequence, targets, the current calendar
//! year split into months, a district with two churches and their small
//! groups, and a prefilled draft move. Running it twice is a no-op.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use anyhow::Context;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tmi_core::clock::{Clock, SystemClock};
use tmi_core::ledger::Metric;
use tmi_core::organization::{GroupType, MetaGroup, TreeCache};
use tmi_db::entities::companies;
use tmi_db::repositories::{
    CompanyRepository, ConfigurationRepository, CreateCompanyInput, CreateMetaGroupInput, CreateMoveInput,
    CreateSequenceInput, CreateYearInput, FiscalRepository, MoveRepository, OrganizationRepository,
    SequenceRepository,
};
use tmi_shared::config::{LogConfig, LogFormat};
use tmi_shared::types::{CompanyId, SequenceId};
use tmi_shared::AppConfig;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEMO_COMPANY: &str = "Demo Conference";

/// Units per small group and month.
const DEMO_TARGETS: [(Metric, i64); 4] = [
    (Metric::Baptism, 2),
    (Metric::Tithe, 500),
    (Metric::SmallGroup, 1),
    (Metric::Gathering, 20),
];

const DEMO_CHURCHES: [(&str, [&str; 2]); 2] = [("Central", ["Hope", "Faith"]), ("Riverside", ["Grace", "Shalom"])];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.log);

    let db = tmi_db::connect_with(&config.database)
        .await
        .context("Failed to connect to database")?;
    info!("Connected to database");

    if companies::Entity::find()
        .filter(companies::Column::Name.eq(DEMO_COMPANY))
        .one(&db)
        .await?
        .is_some()
    {
        info!(company = DEMO_COMPANY, "Demo data already present, skipping");
        return Ok(());
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock::from_name(&config.ledger.timezone)?);
    let company_id = seed_company(&db, &config).await?;
    seed_calendar(&db, clock.clone(), company_id).await?;

    let cache = TreeCache::with_config(config.cache.tree_capacity, config.cache.tree_ttl_secs);
    let church = seed_tree(&db, &cache, company_id).await?;

    let moves = MoveRepository::with_parts(db.clone(), cache, clock);
    let mut input = CreateMoveInput::new(company_id, church.id);
    input.description = Some("Monthly report".to_string());
    input.prefill = true;
    let created = moves.create(input).await.context("Failed to create demo move")?;
    info!(move_id = %created.mv.id, count = created.lines.len(), "Seeded draft move");

    info!(company_id = %company_id, "Seeding complete");
    Ok(())
}

fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));
    let registry = tracing_subscriber::registry().with(filter);
    match log.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Company, move sequence and targets.
async fn seed_company(db: &DatabaseConnection, config: &AppConfig) -> anyhow::Result<CompanyId> {
    let company = CompanyRepository::new(db.clone())
        .create(CreateCompanyInput {
            name: DEMO_COMPANY.to_string(),
            parent_id: None,
            currency_code: "USD".to_string(),
            currency_digits: config.ledger.default_currency_digits,
        })
        .await
        .context("Failed to create company")?;
    let company_id = CompanyId::from(company.id);

    let sequence = SequenceRepository::new(db.clone())
        .create(CreateSequenceInput {
            company_id: Some(company_id),
            name: "Moves".to_string(),
            prefix: config.ledger.move_sequence_prefix.clone(),
            padding: config.ledger.move_sequence_padding,
        })
        .await
        .context("Failed to create move sequence")?;

    let configuration = ConfigurationRepository::new(db.clone());
    configuration
        .set_move_sequence(company_id, SequenceId::from(sequence.id))
        .await?;
    for (metric, unit) in DEMO_TARGETS {
        configuration
            .set_target(company_id, metric, Decimal::from(unit))
            .await
            .with_context(|| format!("Failed to set {metric} target"))?;
    }

    info!(company_id = %company_id, "Seeded company");
    Ok(company_id)
}

/// The current calendar year in monthly periods.
async fn seed_calendar(db: &DatabaseConnection, clock: Arc<dyn Clock>, company_id: CompanyId) -> anyhow::Result<()> {
    let year = clock.today().year();
    let (start_date, end_date) = NaiveDate::from_ymd_opt(year, 1, 1)
        .zip(NaiveDate::from_ymd_opt(year, 12, 31))
        .context("Invalid calendar year")?;

    let fiscal = FiscalRepository::with_clock(db.clone(), clock);
    let created = fiscal
        .create_year(CreateYearInput {
            company_id,
            name: year.to_string(),
            start_date,
            end_date,
        })
        .await
        .context("Failed to create year")?;
    let periods = fiscal.create_period(&[created.id], 1).await?;

    info!(year_id = %created.id, count = periods.len(), "Seeded calendar");
    Ok(())
}

/// A district with its churches and small groups; returns the first church.
async fn seed_tree(db: &DatabaseConnection, cache: &TreeCache, company_id: CompanyId) -> anyhow::Result<MetaGroup> {
    let organization = OrganizationRepository::with_cache(db.clone(), cache.clone());

    let district = organization
        .create_meta_group(
            CreateMetaGroupInput::new(company_id, "North District")
                .of_type(GroupType::District)
                .with_code("ND"),
        )
        .await?;

    let mut churches = Vec::new();
    for (name, small_groups) in DEMO_CHURCHES {
        let church = organization
            .create_meta_group(
                CreateMetaGroupInput::new(company_id, name)
                    .of_type(GroupType::Church)
                    .under(district.id),
            )
            .await?;
        organization.create_group(church.id).await?;

        for sg in small_groups {
            let node = organization
                .create_meta_group(CreateMetaGroupInput::new(company_id, sg).under(church.id))
                .await?;
            organization.create_group(node.id).await?;
        }
        churches.push(church);
    }

    info!(district = %district.id, churches = churches.len(), "Seeded organization tree");
    churches.into_iter().next().context("No church seeded")
}
