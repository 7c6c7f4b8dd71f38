use anyhow::{anyhow, Result};
use mentoria::{
    conversation::{self, Summary},
    responses::ResponseTables,
    session::Session,
    AppConfig, MoodPipeline,
};
use std::env;

fn main() -> Result<()> {
    let text = env::args().skip(1).collect::<Vec<_>>().join(" ");
    if text.trim().is_empty() {
        return Err(anyhow!("usage: mood_cli <how are you feeling?>"));
    }

    let cfg = AppConfig::from_env()?;
    let pipeline = MoodPipeline::load(&cfg)?;
    let tables = ResponseTables::bundled();
    let mut rng = rand::thread_rng();
    let mut session = Session::new();

    let exchange = conversation::submit(&mut session, "cli", &text, &pipeline, tables, &mut rng)?;
    println!("🏷  Label:     {}", exchange.label);
    println!("🤖 Reply:     {}", exchange.reply);
    println!("❓ Follow-up: {}", exchange.follow_up);
    if exchange.is_crisis(&cfg.high_risk_label) {
        println!("🚨 If you are in crisis, please contact a mental health professional or helpline in your country.");
        println!("   {}", cfg.crisis_url);
    }

    if let Summary::Diagnosis { closing, strategies, .. } =
        conversation::finish(&session, tables, &mut rng)
    {
        println!("{closing}");
        for strat in strategies {
            println!("  - {strat}");
        }
    }

    Ok(())
}
