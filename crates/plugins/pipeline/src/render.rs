//! Plain-text rendering of merge requests and review threads.
//!
//! Every renderer is infallible: missing optional fields turn into
//! placeholder text or omitted lines.

use glreview_core::{MergeRequest, Note};

use crate::threads::{CommentThreads, UNKNOWN_PATH};

// ============================================================================
// Flat listing
// ============================================================================

/// Render every reviewable note of several merge requests as one listing.
///
/// Each merge request gets a `- !<iid>: <title>` line followed either by its
/// positioned, non-system notes or by `(No comments)`.
pub fn render_flat_listing(entries: &[(MergeRequest, Vec<Note>)]) -> String {
    let mut output = String::new();
    output.push_str(&format!("Found {} merge request(s):\n", entries.len()));

    for (mr, notes) in entries {
        output.push_str(&format!("- !{}: {}\n", mr.iid, mr.title));

        let mut shown = 0;
        for note in notes {
            let Some(position) = note.review_position() else {
                continue;
            };
            shown += 1;

            let path = position.new_path.as_deref().unwrap_or(UNKNOWN_PATH);
            let line = position
                .new_line
                .map(|l| l.to_string())
                .unwrap_or_else(|| "Unknown".to_string());

            output.push_str(&format!("  File: {}\n", path));
            output.push_str(&format!("  Line: {}\n", line));
            output.push_str(&format!("  Comment by {}\n", note.author.username));
            output.push_str(&format!("  Resolved {}\n", note.resolved));
            output.push_str(&format!("  {}\n\n", note.body));
        }

        if shown == 0 {
            output.push_str("  (No comments)\n");
        }
    }

    output
}

// ============================================================================
// Threads
// ============================================================================

/// Render grouped threads, one text block per file.
pub fn render_threads(threads: &CommentThreads) -> Vec<String> {
    threads
        .iter()
        .map(|(path, groups)| {
            let mut output = format!("\nFile: {}\n", path);

            for notes in groups.values() {
                // Line and resolution are shown once per thread, from its first note.
                if let Some(first) = notes.first() {
                    if let Some(line) = first.position.as_ref().and_then(|p| p.new_line) {
                        output.push_str(&format!("Line: {}\n", line));
                    }
                    output.push_str(&format!("Resolved: {}\n", first.resolved));
                }

                for note in notes {
                    output.push_str(&format!(
                        "[{}] Comment by {}\n",
                        note.created_at, note.author.username
                    ));
                    output.push_str(&format!("{}\n\n", note.body));
                }
            }

            output
        })
        .collect()
}

// ============================================================================
// Merge request summaries
// ============================================================================

/// Header preceding merge request summaries.
pub fn render_summary_header(count: usize, branch: &str) -> String {
    format!("Found {} merge request(s) for branch {}", count, branch)
}

/// Render one merge request summary. The URL line has no trailing newline.
pub fn render_merge_request_summary(mr: &MergeRequest) -> String {
    let mut output = String::new();

    output.push_str(&format!("!{}: {}\n", mr.iid, mr.title));
    if let Some(description) = mr.description_text() {
        output.push_str(&format!("Description: {}\n", description));
    }
    if let Some(author) = mr.author_username() {
        output.push_str(&format!("Author: {}\n", author));
    }
    output.push_str(&format!("Source Branch: {}\n", mr.source_branch));
    output.push_str(&format!("Target Branch: {}\n", mr.target_branch));
    output.push_str(&format!("State: {}\n", mr.state));
    output.push_str(&format!("URL: {}", mr.web_url));

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::threads::group_notes;
    use glreview_core::{LinePoint, LineRange, MergeRequestAuthor, NoteAuthor, Position};

    fn merge_request(iid: u64, title: &str) -> MergeRequest {
        MergeRequest {
            id: iid + 1000,
            iid,
            title: title.to_string(),
            description: None,
            web_url: format!("https://gitlab.com/g/p/-/merge_requests/{}", iid),
            source_branch: "feature-x".to_string(),
            target_branch: "main".to_string(),
            state: "opened".to_string(),
            author: None,
        }
    }

    fn note(id: u64, user: &str, position: Option<Position>) -> Note {
        Note {
            id,
            body: format!("body {}", id),
            author: NoteAuthor {
                username: user.to_string(),
            },
            system: false,
            created_at: "2024-01-01T00:00:00Z".to_string(),
            resolved: false,
            position,
        }
    }

    fn at(path: Option<&str>, line: Option<u32>) -> Option<Position> {
        Some(Position {
            new_path: path.map(str::to_string),
            new_line: line,
            line_range: None,
        })
    }

    #[test]
    fn test_flat_listing() {
        let mut resolved = note(2, "bob", at(None, None));
        resolved.resolved = true;
        let entries = vec![(
            merge_request(42, "Add X"),
            vec![note(1, "alice", at(Some("a.rs"), Some(10))), resolved],
        )];

        let output = render_flat_listing(&entries);

        assert_eq!(
            output,
            "Found 1 merge request(s):\n\
             - !42: Add X\n\
             \x20 File: a.rs\n\
             \x20 Line: 10\n\
             \x20 Comment by alice\n\
             \x20 Resolved false\n\
             \x20 body 1\n\
             \n\
             \x20 File: Unknown\n\
             \x20 Line: Unknown\n\
             \x20 Comment by bob\n\
             \x20 Resolved true\n\
             \x20 body 2\n\
             \n"
        );
    }

    #[test]
    fn test_flat_listing_no_displayable_comments() {
        let mut system = note(1, "gitlab", at(Some("a.rs"), Some(1)));
        system.system = true;
        let entries = vec![
            (merge_request(1, "Empty"), vec![]),
            (
                merge_request(2, "Only noise"),
                vec![system, note(2, "alice", None)],
            ),
        ];

        let output = render_flat_listing(&entries);

        assert_eq!(
            output,
            "Found 2 merge request(s):\n\
             - !1: Empty\n\
             \x20 (No comments)\n\
             - !2: Only noise\n\
             \x20 (No comments)\n"
        );
    }

    #[test]
    fn test_render_threads_one_block_per_file() {
        let coded = Some(Position {
            new_path: Some("a.rs".to_string()),
            new_line: Some(3),
            line_range: Some(LineRange {
                start: Some(LinePoint {
                    line_code: Some("abc_3_3".to_string()),
                }),
            }),
        });
        let mut first = note(1, "alice", coded.clone());
        first.resolved = true;
        let notes = vec![
            first,
            note(2, "bob", coded),
            note(3, "carol", at(Some("a.rs"), None)),
            note(4, "dave", at(Some("b.rs"), Some(8))),
        ];

        let blocks = render_threads(&group_notes(&notes));

        assert_eq!(blocks.len(), 2);
        assert_eq!(
            blocks[0],
            "\nFile: a.rs\n\
             Line: 3\n\
             Resolved: true\n\
             [2024-01-01T00:00:00Z] Comment by alice\n\
             body 1\n\
             \n\
             [2024-01-01T00:00:00Z] Comment by bob\n\
             body 2\n\
             \n\
             Resolved: false\n\
             [2024-01-01T00:00:00Z] Comment by carol\n\
             body 3\n\
             \n"
        );
        assert_eq!(
            blocks[1],
            "\nFile: b.rs\n\
             Line: 8\n\
             Resolved: false\n\
             [2024-01-01T00:00:00Z] Comment by dave\n\
             body 4\n\
             \n"
        );
    }

    #[test]
    fn test_render_threads_empty() {
        assert!(render_threads(&CommentThreads::new()).is_empty());
    }

    #[test]
    fn test_summary_full() {
        let mut mr = merge_request(7, "Refactor parser");
        mr.description = Some("Splits the lexer out".to_string());
        mr.author = Some(MergeRequestAuthor {
            username: Some("alice".to_string()),
        });

        assert_eq!(
            render_merge_request_summary(&mr),
            "!7: Refactor parser\n\
             Description: Splits the lexer out\n\
             Author: alice\n\
             Source Branch: feature-x\n\
             Target Branch: main\n\
             State: opened\n\
             URL: https://gitlab.com/g/p/-/merge_requests/7"
        );
    }

    #[test]
    fn test_summary_omits_empty_optionals() {
        let mut mr = merge_request(7, "Refactor parser");
        mr.description = Some(String::new());
        mr.author = Some(MergeRequestAuthor { username: None });

        let output = render_merge_request_summary(&mr);

        assert!(!output.contains("Description:"));
        assert!(!output.contains("Author:"));
        assert!(output.starts_with("!7: Refactor parser\nSource Branch: feature-x\n"));
        assert!(!output.ends_with('\n'));
    }

    #[test]
    fn test_summary_header() {
        assert_eq!(
            render_summary_header(2, "feature-x"),
            "Found 2 merge request(s) for branch feature-x"
        );
    }
}
