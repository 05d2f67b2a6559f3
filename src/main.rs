use campus_tt_notify::calendar::get_calendar_config;
use campus_tt_notify::db::init_connection;
use campus_tt_notify::models::{Args, Config};
use campus_tt_notify::scheduler::start_scheduler;
use campus_tt_notify::timetable_getter::{LocalTimetable, RemoteTimetable, TimetableGetter};

use clap::Parser;
use figment::{
    providers::{Env, Format, Json},
    Figment,
};
use lettre::{
    transport::smtp::authentication::{Credentials, Mechanism},
    SmtpTransport,
};
use log::{info, warn};

#[tokio::main]
async fn main() {
    /* Setup logging */
    env_logger::builder()
        .target(env_logger::Target::Stdout)
        .filter_level(log::LevelFilter::Info)
        .init();

    /* Get all the required resources */
    let args = Args::parse();
    let config: Config = Figment::new()
        .merge(Json::file(&args.config_json_path))
        .merge(Env::prefixed("CAMPUS_"))
        .extract()
        .unwrap();
    info!(
        "Read config.json from {}",
        std::path::absolute(&args.config_json_path)
            .unwrap()
            .display()
    );
    let sender = SmtpTransport::relay(&config.email_relay)
        .unwrap()
        .credentials(Credentials::new(
            config.email_sender_username.to_owned(),
            config.email_sender_password.to_owned(),
        ))
        .authentication(vec![Mechanism::Plain])
        .build();
    let pool = init_connection(&args.schedule_sqlite3_path).await.unwrap();

    /* Semester epoch: absent calendar.json falls back to the default start */
    let calendar = get_calendar_config(&args.calendar_json_path);

    /* The timetable document is loaded once and shared by all triggers.
    A missing dataset degrades to empty schedules, not a dead process. */
    let document = match &config.timetable_url {
        Some(url) => {
            RemoteTimetable {
                client: reqwest::Client::new(),
                url: url.to_owned(),
            }
            .get_timetable()
            .await
        }
        None => {
            LocalTimetable {
                path: args.timetable_json_path.clone(),
            }
            .get_timetable()
            .await
        }
    }
    .unwrap_or_else(|| {
        warn!("No timetable dataset available, serving empty schedules");
        Default::default()
    });

    start_scheduler(&pool, &config, &document, calendar.semester_start, &sender).await;
}
