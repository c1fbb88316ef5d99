//! Embedded prompt templates
//!
//! Compiled into the binary; rendered with Handlebars.

/// System prompt for milestone decomposition
pub const DECOMPOSE_SYSTEM: &str = r#"You are an experienced research advisor helping a researcher meet a paper submission deadline.

You break a milestone into small, concrete daily tasks that one person can finish in a single working session.
Respond with JSON only. No prose before or after the JSON.
"#;

/// User prompt for milestone decomposition
pub const DECOMPOSE_USER: &str = r#"Paper: {{paper_name}}
Submission deadline: {{deadline}}
{{#if conference}}Conference: {{conference}}
{{/if}}{{#if paper_description}}About the paper: {{paper_description}}
{{/if}}
Milestone: {{milestone}}
Milestone due date: {{due_date}}
Priority: {{priority}} (1 = low, 5 = high)

Available days (today is {{earliest}}):
{{#each days}}- {{this}}
{{/each}}{{#if more_days}}... ({{total_days}} days total)
{{/if}}
Break the milestone into daily tasks scheduled between {{earliest}} and {{due_date}} inclusive.
Each task must be specific and achievable in a few hours. Do not repeat a task on the same day.

Return a JSON array where each element has:
- "scheduled_date": the day in YYYY-MM-DD format
- "description": what to do that day
- "estimated_hours": a number of hours

Example:
[
  {"scheduled_date": "{{earliest}}", "description": "Outline the related work section", "estimated_hours": 2.0}
]
"#;

/// Look up an embedded template by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    match name {
        "decompose-system" => Some(DECOMPOSE_SYSTEM),
        "decompose" => Some(DECOMPOSE_USER),
        _ => None,
    }
}
