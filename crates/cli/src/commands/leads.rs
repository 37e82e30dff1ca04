use clap::Args;
use serde_json::Value;

use leadmate_core::{Lead, LeadDraft, LeadPatch};

use crate::commands::{flush_store, load_config, open_store, CommandResult};
use crate::GlobalArgs;

#[derive(Args, Debug)]
pub struct AddArgs {
    #[arg(long, help = "Company name (the identifier is derived from it)")]
    pub name: String,
    #[arg(long, help = "Company website")]
    pub website: String,
    #[arg(long, default_value = "", help = "Headquarters location")]
    pub hq: String,
    #[arg(long, default_value = "", help = "Industry label")]
    pub industry: String,
    #[arg(long, help = "Founding year")]
    pub founded: Option<i32>,
    #[arg(long, help = "Employee count")]
    pub employees: Option<u32>,
    #[arg(long, help = "Comma-separated product names")]
    pub products: Option<String>,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    pub id: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub website: Option<String>,
    #[arg(long)]
    pub hq: Option<String>,
    #[arg(long)]
    pub industry: Option<String>,
    #[arg(long, help = "Founding year")]
    pub founded: Option<i32>,
    #[arg(long, help = "Employee count")]
    pub employees: Option<u32>,
    #[arg(long, help = "Comma-separated product names (replaces the list)")]
    pub products: Option<String>,
}

pub fn list(global: &GlobalArgs, search: Option<&str>) -> CommandResult {
    let config = match load_config("list", global) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let store = match open_store("list", &config) {
        Ok(store) => store,
        Err(result) => return result,
    };

    let query = search.unwrap_or_default();
    let matches = store.search(query);
    if matches.is_empty() {
        let message = if query.trim().is_empty() {
            "no leads in the store".to_string()
        } else {
            format!("no leads match `{}`", query.trim())
        };
        return CommandResult::plain(message);
    }

    let lines: Vec<String> = matches.iter().map(|lead| render_summary(lead)).collect();
    CommandResult::plain(lines.join("\n"))
}

pub fn show(global: &GlobalArgs, id: &str) -> CommandResult {
    let config = match load_config("show", global) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let store = match open_store("show", &config) {
        Ok(store) => store,
        Err(result) => return result,
    };

    let Some(lead) = store.get(id) else {
        return CommandResult::failure("show", "not_found", format!("lead not found: {id}"), 5);
    };

    match serde_json::to_string_pretty(lead) {
        Ok(text) => CommandResult::plain(text),
        Err(error) => CommandResult::failure("show", "serialization", error.to_string(), 3),
    }
}

pub fn add(global: &GlobalArgs, args: &AddArgs) -> CommandResult {
    if args.name.trim().is_empty() || args.website.trim().is_empty() {
        return CommandResult::failure(
            "add",
            "usage",
            "both --name and --website must be non-empty",
            5,
        );
    }

    let config = match load_config("add", global) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let mut store = match open_store("add", &config) {
        Ok(store) => store,
        Err(result) => return result,
    };

    let lead = store.create(LeadDraft {
        name: args.name.clone(),
        website: args.website.clone(),
        hq: args.hq.clone(),
        industry: args.industry.clone(),
        founded: args.founded,
        employees: args.employees,
        products: args.products.as_deref().map(split_products).unwrap_or_default(),
    });

    if let Err(result) = flush_store("add", &store) {
        return result;
    }
    CommandResult::plain(format!("created lead `{}`", lead.id))
}

pub fn edit(global: &GlobalArgs, args: &EditArgs) -> CommandResult {
    let patch = LeadPatch {
        name: args.name.clone(),
        website: args.website.clone(),
        hq: args.hq.clone(),
        industry: args.industry.clone(),
        founded: args.founded,
        employees: args.employees,
        products: args.products.as_deref().map(split_products),
        extra: None,
        notes: None,
    };
    if patch.is_empty() {
        return CommandResult::failure("edit", "usage", "no fields to change were provided", 5);
    }

    let config = match load_config("edit", global) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let mut store = match open_store("edit", &config) {
        Ok(store) => store,
        Err(result) => return result,
    };

    match store.update(&args.id, patch) {
        Ok(lead) => {
            if let Err(result) = flush_store("edit", &store) {
                return result;
            }
            CommandResult::plain(format!("updated lead `{}`", lead.id))
        }
        Err(error) => CommandResult::failure("edit", "not_found", error.to_string(), 5),
    }
}

pub fn remove(global: &GlobalArgs, id: &str, yes: bool) -> CommandResult {
    if !yes {
        return CommandResult::failure(
            "remove",
            "confirmation_required",
            format!("pass --yes to delete lead `{id}`"),
            5,
        );
    }

    let config = match load_config("remove", global) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let mut store = match open_store("remove", &config) {
        Ok(store) => store,
        Err(result) => return result,
    };

    match store.delete(id) {
        Ok(()) => {
            if let Err(result) = flush_store("remove", &store) {
                return result;
            }
            CommandResult::plain(format!("removed lead `{id}`"))
        }
        Err(error) => CommandResult::failure("remove", "not_found", error.to_string(), 5),
    }
}

pub fn note(global: &GlobalArgs, id: &str, text: &str) -> CommandResult {
    if text.trim().is_empty() {
        return CommandResult::failure("note", "usage", "note text must not be blank", 5);
    }

    let config = match load_config("note", global) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let mut store = match open_store("note", &config) {
        Ok(store) => store,
        Err(result) => return result,
    };

    match store.append_note(id, text) {
        Ok(lead) => {
            if let Err(result) = flush_store("note", &store) {
                return result;
            }
            let total = lead.notes.len();
            CommandResult::plain(format!("added note to `{}` ({total} total)", lead.id))
        }
        Err(error) => CommandResult::failure("note", "not_found", error.to_string(), 5),
    }
}

pub fn set(global: &GlobalArgs, id: &str, key: &str, value: &str) -> CommandResult {
    let key = key.trim();
    let value = value.trim();
    if key.is_empty() || value.is_empty() {
        return CommandResult::failure("set", "usage", "both key and value must be non-empty", 5);
    }

    let config = match load_config("set", global) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let mut store = match open_store("set", &config) {
        Ok(store) => store,
        Err(result) => return result,
    };

    let merged = match store.get(id) {
        Some(lead) => lead.merged_extra([(key.to_string(), Value::String(value.to_string()))]),
        None => {
            return CommandResult::failure("set", "not_found", format!("lead not found: {id}"), 5);
        }
    };

    match store.update(id, LeadPatch { extra: Some(merged), ..LeadPatch::default() }) {
        Ok(lead) => {
            if let Err(result) = flush_store("set", &store) {
                return result;
            }
            CommandResult::plain(format!("set `{key}` on `{}`", lead.id))
        }
        Err(error) => CommandResult::failure("set", "not_found", error.to_string(), 5),
    }
}

fn split_products(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

fn render_summary(lead: &Lead) -> String {
    let mut details = Vec::new();
    if !lead.industry.is_empty() {
        details.push(lead.industry.clone());
    }
    if !lead.hq.is_empty() {
        details.push(lead.hq.clone());
    }
    if let Some(year) = lead.founded {
        details.push(format!("est. {year}"));
    }
    let details =
        if details.is_empty() { String::new() } else { format!(" ({})", details.join(", ")) };

    format!("- {}: {}{} [{} notes]", lead.id, lead.name, details, lead.notes.len())
}
