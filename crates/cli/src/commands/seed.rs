use leadmate_core::LeadDraft;

use crate::commands::{flush_store, load_config, open_store, CommandResult};
use crate::GlobalArgs;

pub fn run(global: &GlobalArgs, force: bool) -> CommandResult {
    let config = match load_config("seed", global) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let mut store = match open_store("seed", &config) {
        Ok(store) => store,
        Err(result) => return result,
    };

    if !store.is_empty() {
        if !force {
            return CommandResult::failure(
                "seed",
                "store_not_empty",
                format!(
                    "store already holds {} lead(s); pass --force to replace them with demo data",
                    store.len()
                ),
                5,
            );
        }

        let existing: Vec<String> =
            store.search("").iter().map(|lead| lead.id.as_str().to_string()).collect();
        for id in existing {
            if let Err(error) = store.delete(&id) {
                return CommandResult::failure("seed", "seed_reset", error.to_string(), 5);
            }
        }
    }

    let mut lines = Vec::new();
    for draft in demo_leads() {
        let lead = store.create(draft);
        lines.push(format!("  - {}: {}", lead.id, lead.name));
    }

    if let Err(result) = flush_store("seed", &store) {
        return result;
    }

    let message = format!("seeded {} demo leads:\n{}", lines.len(), lines.join("\n"));
    CommandResult::success("seed", message)
}

fn demo_leads() -> Vec<LeadDraft> {
    vec![
        LeadDraft {
            name: "Nordic Cargo".to_string(),
            website: "nordiccargo.example".to_string(),
            hq: "Oslo".to_string(),
            industry: "Freight".to_string(),
            founded: Some(2011),
            employees: Some(340),
            products: vec!["ocean".to_string(), "customs".to_string()],
        },
        LeadDraft {
            name: "Vertex Robotics".to_string(),
            website: "vertexrobotics.example".to_string(),
            hq: "Munich".to_string(),
            industry: "Industrial Automation".to_string(),
            founded: Some(2017),
            employees: Some(85),
            products: Vec::new(),
        },
        LeadDraft {
            name: "Bluepeak Analytics".to_string(),
            website: "bluepeak.example".to_string(),
            hq: "Austin".to_string(),
            industry: "SaaS Analytics".to_string(),
            founded: Some(2019),
            employees: Some(42),
            products: vec!["dashboards".to_string(), "alerts".to_string()],
        },
    ]
}
