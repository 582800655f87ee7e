//! Demo mode: synthetic data instead of live sources.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use lookout_core::poll::FetchOutcome;

use crate::app::DemoSlot;

const DEMO_INTERVAL: Duration = Duration::from_secs(2);

/// Feed every data slot with plausible fake payloads on an interval.
pub fn spawn(slots: Vec<DemoSlot>, tx: mpsc::UnboundedSender<FetchOutcome>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut rng = StdRng::from_entropy();
        let mut interval = tokio::time::interval(DEMO_INTERVAL);
        let mut uptime: u64 = 86_400 * 3 + 4_500;
        let mut stars: u64 = 1_200;

        loop {
            interval.tick().await;
            uptime += DEMO_INTERVAL.as_secs();
            if rng.gen_bool(0.3) {
                stars += 1;
            }

            for slot in &slots {
                let data = synthesize(&mut rng, &slot.plugin, uptime, stars);
                let outcome = FetchOutcome {
                    id: slot.id,
                    generation: slot.generation,
                    result: Ok(data),
                };
                if tx.send(outcome).is_err() {
                    return;
                }
            }
        }
    })
}

fn synthesize(rng: &mut StdRng, plugin: &str, uptime: u64, stars: u64) -> Value {
    match plugin {
        "system" => {
            let total: u64 = 16 * 1024 * 1024 * 1024;
            json!({
                "cpu_percent": rng.gen_range(5.0..95.0),
                "memory_total": total,
                "memory_free": rng.gen_range(total / 8..total / 2),
                "uptime_secs": uptime,
                "load_one": rng.gen_range(0.1..4.0),
                "load_five": rng.gen_range(0.1..3.0),
                "load_fifteen": rng.gen_range(0.1..2.0),
                "hostname": "demo-host",
            })
        }
        "weather" => {
            let weathercode = [0u64, 2, 3, 61, 71, 95][rng.gen_range(0..6)];
            json!({
                "current_weather": {
                    "temperature": rng.gen_range(-5.0..32.0),
                    "windspeed": rng.gen_range(0.0..45.0),
                    "weathercode": weathercode,
                }
            })
        }
        "github" => json!({
            "full_name": "lookout-tui/lookout",
            "description": "A terminal dashboard of pluggable widgets",
            "stargazers_count": stars,
            "forks_count": stars / 12,
            "open_issues_count": rng.gen_range(3..40),
            "pushed_at": "2026-08-01T10:30:00Z",
        }),
        "docker" => {
            let images = ["nginx:1.27", "postgres:16", "redis:7", "grafana/grafana"];
            let containers: Vec<Value> = (0..rng.gen_range(2..5))
                .map(|i| {
                    let running = rng.gen_bool(0.8);
                    json!({
                        "Names": format!("demo-svc-{i}"),
                        "Image": images[rng.gen_range(0..images.len())],
                        "Status": if running { "Up 2 hours" } else { "Exited (0) 5 minutes ago" },
                        "State": if running { "running" } else { "exited" },
                    })
                })
                .collect();
            Value::Array(containers)
        }
        _ => json!({}),
    }
}
