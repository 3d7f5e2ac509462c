//! Prompt builders for the drafting endpoints.
//!
//! Every prompt instructs the model to answer with a single JSON object and
//! spells out the exact field names the matching type in [`crate::types`]
//! deserializes. Keep the two in sync when changing either side.

use crate::types::CategoryRef;

/// Prompt for drafting a full task from a free-text description.
///
/// `categories` lets the model reference categories that actually exist;
/// an empty slice omits the section.
pub fn task_details(description: &str, categories: &[CategoryRef]) -> String {
    let mut prompt = String::from(
        "You are a task planning assistant. Analyze the following task \
         description and produce structured task details.\n\n",
    );
    prompt.push_str(&format!("Task description: {}\n\n", description));

    if !categories.is_empty() {
        prompt.push_str("Available categories:\n");
        for c in categories {
            prompt.push_str(&format!("- {} (id: {})\n", c.name, c.id));
        }
        prompt.push('\n');
    }

    prompt.push_str(
        "Respond with a single JSON object with exactly these fields:\n\
         {\n\
           \"title\": \"concise actionable title (max 80 chars)\",\n\
           \"description\": \"clear expanded description\",\n\
           \"priority\": \"low\" | \"medium\" | \"high\" | \"urgent\",\n\
           \"estimatedTime\": \"human estimate, e.g. '2 hours'\",\n\
           \"suggestedDueDate\": <days from today as an integer, or null>,\n\
           \"tags\": [\"up to 5 short tags\"],\n\
           \"checklist\": [\"3 to 7 concrete steps\"]\n\
         }\n\
         Return only the JSON object, no markdown fences or commentary.",
    );
    prompt
}

/// Prompt for decomposing a task into ordered subtasks.
pub fn breakdown(title: &str, description: &str) -> String {
    format!(
        "You are a project planning assistant. Break the following task into \
         smaller, independently completable subtasks.\n\n\
         Task: {}\n\
         Details: {}\n\n\
         Respond with a single JSON object:\n\
         {{\n\
           \"analysis\": \"one paragraph on how to approach this\",\n\
           \"subtasks\": [\n\
             {{\"title\": \"...\", \"description\": \"...\", \"order\": 1}}\n\
           ],\n\
           \"totalEstimatedTime\": \"combined estimate\",\n\
           \"recommendedApproach\": \"sequencing advice\"\n\
         }}\n\
         Produce between 3 and 8 subtasks, ordered starting at 1. Return only \
         the JSON object.",
        title, description
    )
}

/// Prompt for rewriting a task description with extracted structure.
pub fn enhance(title: &str, description: &str) -> String {
    format!(
        "You are a writing assistant. Improve the following task description: \
         make it specific, actionable, and well organized without inventing \
         requirements.\n\n\
         Task: {}\n\
         Current description: {}\n\n\
         Respond with a single JSON object:\n\
         {{\n\
           \"enhancedDescription\": \"the rewritten description\",\n\
           \"objectives\": [\"what done looks like\"],\n\
           \"keyPoints\": [\"important details to not lose\"],\n\
           \"successCriteria\": [\"verifiable completion checks\"]\n\
         }}\n\
         Return only the JSON object.",
        title, description
    )
}

/// Prompt for assessing the priority of an existing task.
pub fn priority(title: &str, description: &str, due_date: Option<&str>) -> String {
    let due = due_date.unwrap_or("none set");
    format!(
        "You are a prioritization assistant. Assess how urgent the following \
         task is.\n\n\
         Task: {}\n\
         Details: {}\n\
         Due date: {}\n\n\
         Respond with a single JSON object:\n\
         {{\n\
           \"priority\": \"low\" | \"medium\" | \"high\" | \"urgent\",\n\
           \"reasoning\": \"one or two sentences\",\n\
           \"urgencyScore\": <integer 1-10>\n\
         }}\n\
         Return only the JSON object.",
        title, description, due
    )
}

/// Prompt for suggesting follow-up tasks from recent activity.
pub fn suggestions(recent_titles: &[String]) -> String {
    let mut prompt = String::from(
        "You are a task planning assistant. Based on the user's recent tasks, \
         suggest useful follow-up tasks they may have missed.\n\nRecent tasks:\n",
    );
    if recent_titles.is_empty() {
        prompt.push_str("(none yet)\n");
    } else {
        for t in recent_titles {
            prompt.push_str(&format!("- {}\n", t));
        }
    }
    prompt.push_str(
        "\nRespond with a single JSON object:\n\
         {\n\
           \"suggestions\": [\n\
             {\"title\": \"...\", \"reason\": \"why this helps\", \
              \"priority\": \"low\" | \"medium\" | \"high\" | \"urgent\"}\n\
           ]\n\
         }\n\
         Produce 3 to 5 suggestions. Return only the JSON object.",
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_task_details_includes_description_and_categories() {
        let cats = vec![CategoryRef {
            id: Uuid::new_v4(),
            name: "Work".to_string(),
        }];
        let p = task_details("plan the offsite", &cats);
        assert!(p.contains("plan the offsite"));
        assert!(p.contains("Work"));
        assert!(p.contains("suggestedDueDate"));
    }

    #[test]
    fn test_task_details_omits_empty_category_section() {
        let p = task_details("x", &[]);
        assert!(!p.contains("Available categories"));
    }

    #[test]
    fn test_breakdown_names_expected_fields() {
        let p = breakdown("Migrate DB", "move to the new cluster");
        assert!(p.contains("Migrate DB"));
        assert!(p.contains("subtasks"));
        assert!(p.contains("totalEstimatedTime"));
    }

    #[test]
    fn test_priority_prompt_handles_missing_due_date() {
        let p = priority("Pay invoice", "net 30", None);
        assert!(p.contains("none set"));
        assert!(p.contains("urgencyScore"));
    }

    #[test]
    fn test_suggestions_lists_recent_titles() {
        let p = suggestions(&["Ship v2".to_string()]);
        assert!(p.contains("- Ship v2"));
    }
}
