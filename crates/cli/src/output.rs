//! Terminal rendering for tasks, watch events, models and projects.

use std::path::PathBuf;

use serde::Serialize;
use wiro_core::catalog::{Project, ToolDetail, ToolSummary};
use wiro_core::types::Task;
use wiro_core::watch_event::WatchEvent;

/// Detail lines are cut to this many characters.
const EVENT_DETAIL_MAX: usize = 180;
const DEBUG_ERROR_MAX: usize = 400;
const TOOL_SUMMARY_MAX: usize = 110;
const TOOL_DESCRIPTION_MAX: usize = 220;

/// Event kinds whose text is worth showing under the header line.
const DETAILED_KINDS: &[&str] = &["warning", "task_output", "task_error"];

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_task(task: &Task) {
    print!("{}", format_task(task));
}

pub fn print_watch_event(event: &WatchEvent) {
    for line in format_watch_event(event) {
        println!("{line}");
    }
}

pub fn print_downloads(paths: &[PathBuf]) {
    if paths.is_empty() {
        return;
    }
    println!("Downloaded files:");
    for path in paths {
        println!("- {}", path.display());
    }
}

pub fn print_tools(tools: &[ToolSummary]) {
    print!("{}", format_tools(tools));
}

pub fn print_tool_detail(tool: &ToolDetail) {
    print!("{}", format_tool_detail(tool));
}

pub fn print_projects(projects: &[Project]) {
    print!("{}", format_projects(projects));
}

/// One `- owner/model<TAB>description` line per model.
pub fn format_tools(tools: &[ToolSummary]) -> String {
    tools
        .iter()
        .map(|t| format!("- {}\t{}\n", t.slug(), truncate(&t.description, TOOL_SUMMARY_MAX)))
        .collect()
}

pub fn format_tool_detail(tool: &ToolDetail) -> String {
    let mut out = format!(
        "Model: {}/{}\nDescription: {}\nInputs:\n",
        tool.slug_owner,
        tool.slug_project,
        truncate(&tool.description, TOOL_DESCRIPTION_MAX)
    );
    for item in tool.flatten_items(true) {
        let level = if item.advanced { "advanced" } else { "quick" };
        out.push_str(&format!(
            "- {} ({}, {}, required={})\n",
            item.id, item.kind, level, item.required
        ));
    }
    out
}

pub fn format_projects(projects: &[Project]) -> String {
    let mut out = String::from("PROJECTS\n");
    for p in projects {
        out.push_str(&format!(
            "- {} ({}) auth={} requests={}\n",
            p.name, p.api_key, p.auth_method, p.request_count
        ));
    }
    out
}

pub fn format_task(task: &Task) -> String {
    let mut out = format!(
        "Task ID: {}\nStatus: {}\nCreated: {}\n",
        task.id, task.status, task.create_time
    );
    if !task.outputs.is_empty() {
        out.push_str("Outputs:\n");
        for output in &task.outputs {
            out.push_str(&format!("- {}\n", output.url));
        }
    }
    if !task.debug_error.trim().is_empty() {
        out.push_str(&format!(
            "DebugError: {}\n",
            truncate(&task.debug_error, DEBUG_ERROR_MAX)
        ));
    }
    out
}

/// `[source] kind`, plus an indented detail line for warnings, output
/// and error messages. Events without a kind print nothing.
pub fn format_watch_event(event: &WatchEvent) -> Vec<String> {
    let kind = event.kind.trim();
    if kind.is_empty() {
        return Vec::new();
    }

    let mut lines = vec![format!("[{}] {}", event.source, kind)];
    let text = event.text.trim();
    if DETAILED_KINDS.contains(&kind) && !text.is_empty() {
        lines.push(format!("  {}", truncate(text, EVENT_DETAIL_MAX)));
    }
    lines
}

/// Trim and cut `value` to at most `max` characters, marking the cut
/// with `...`.
pub fn truncate(value: &str, max: usize) -> String {
    let value = value.trim();
    if value.chars().count() <= max {
        return value.to_string();
    }
    if max <= 3 {
        return value.chars().take(max).collect();
    }
    let mut cut: String = value.chars().take(max - 3).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use wiro_core::catalog::{ToolParameterGroup, ToolParameterItem};
    use wiro_core::types::TaskOutput;
    use wiro_core::watch_event::EventSource;

    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("  short  ", 10), "short");
        assert_eq!(truncate("abcdefghij", 8), "abcde...");
        assert_eq!(truncate("ééééé", 4), "é...");
        assert_eq!(truncate("abcdef", 2), "ab");
    }

    #[test]
    fn stream_progress_has_detail_line() {
        let ev = WatchEvent::new(EventSource::Stream, "task_output").with_text("\"50%\"");
        assert_eq!(format_watch_event(&ev), ["[stream] task_output", "  \"50%\""]);
    }

    #[test]
    fn poll_status_is_single_line() {
        let ev = WatchEvent::new(EventSource::Poll, "task_start").with_text("polled status");
        assert_eq!(format_watch_event(&ev), ["[poll] task_start"]);
    }

    #[test]
    fn warning_detail_is_truncated() {
        let ev = WatchEvent::warning("x".repeat(500));
        let lines = format_watch_event(&ev);
        assert_eq!(lines[0], "[system] warning");
        assert_eq!(lines[1].chars().count(), 2 + EVENT_DETAIL_MAX);
        assert!(lines[1].ends_with("..."));
    }

    #[test]
    fn kindless_events_are_hidden() {
        let ev = WatchEvent::new(EventSource::Stream, " ").with_text("ignored");
        assert!(format_watch_event(&ev).is_empty());
    }

    #[test]
    fn task_lists_outputs_and_debug_error() {
        let task = Task {
            id: "534574".into(),
            status: "task_postprocess_end".into(),
            create_time: "1711358771".into(),
            debug_error: "  CUDA out of memory  ".into(),
            outputs: vec![TaskOutput {
                url: "https://cdn1.wiro.ai/0.png".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(
            format_task(&task),
            "Task ID: 534574\n\
             Status: task_postprocess_end\n\
             Created: 1711358771\n\
             Outputs:\n\
             - https://cdn1.wiro.ai/0.png\n\
             DebugError: CUDA out of memory\n"
        );
    }

    #[test]
    fn tools_render_one_line_each() {
        let tools = vec![ToolSummary {
            slug_owner: "wiro".into(),
            slug_project: "flux".into(),
            description: format!("  {}  ", "d".repeat(200)),
            ..Default::default()
        }];
        let out = format_tools(&tools);
        assert!(out.starts_with("- wiro/flux\tddd"));
        assert!(out.ends_with("...\n"));
        assert_eq!(out.trim_end().chars().count(), "- wiro/flux\t".len() + TOOL_SUMMARY_MAX);
    }

    #[test]
    fn tool_detail_lists_quick_inputs_before_advanced() {
        let tool = ToolDetail {
            slug_owner: "wiro".into(),
            slug_project: "flux".into(),
            description: "Text to image".into(),
            parameters: vec![ToolParameterGroup {
                items: vec![
                    ToolParameterItem {
                        id: "steps".into(),
                        kind: "number".into(),
                        advanced: true,
                        ..Default::default()
                    },
                    ToolParameterItem {
                        id: "prompt".into(),
                        kind: "textarea".into(),
                        required: true,
                        ..Default::default()
                    },
                ],
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(
            format_tool_detail(&tool),
            "Model: wiro/flux\n\
             Description: Text to image\n\
             Inputs:\n\
             - prompt (textarea, quick, required=true)\n\
             - steps (number, advanced, required=false)\n"
        );
    }

    #[test]
    fn projects_render_key_and_auth() {
        let projects = vec![Project {
            name: "Demo".into(),
            api_key: "k-1".into(),
            auth_method: "signature".into(),
            request_count: "12".into(),
            ..Default::default()
        }];
        assert_eq!(
            format_projects(&projects),
            "PROJECTS\n- Demo (k-1) auth=signature requests=12\n"
        );
    }
}
