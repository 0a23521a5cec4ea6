use super::types::{PostContext, MAX_RESULTS};

/// Separator placed between serialized posts
pub const POST_DELIMITER: &str = "\n\n---\n\n";

pub(crate) fn truncate_chars(input: &str, max_chars: usize) -> &str {
    match input.char_indices().nth(max_chars) {
        Some((idx, _)) => &input[..idx],
        None => input,
    }
}

/// Fixed instruction sent as the system prompt (or prepended for vendors
/// without a system slot)
pub fn system_instruction() -> String {
    format!(
        "You are a search assistant for a website. Answer the user's question using ONLY \
the posts provided below. Do not use outside knowledge.\n\
\n\
Rules:\n\
- If posts contain conflicting information, prefer the most recently published post.\n\
- If the posts do not contain the answer, say so explicitly. Never invent facts.\n\
- Write the answer as a short HTML fragment using only <p>, <ul>, <li>, <strong> and <a> tags.\n\
- List the posts you relied on in \"results\", most relevant first, at most {MAX_RESULTS} entries.\n\
- Each result must copy the id, title, url and type of a provided post and include a one-sentence excerpt.\n\
\n\
Respond with a single JSON object and nothing else, no markdown and no code fences, in exactly this format:\n\
{{\"answer_html\": \"<p>...</p>\", \"results\": [{{\"id\": 123, \"title\": \"...\", \"url\": \"...\", \"excerpt\": \"...\", \"type\": \"post\"}}]}}"
    )
}

/// Serialize posts and the query into the user message
///
/// Only the first `max_posts` posts are included and each post body is cut
/// to `max_content_chars` characters.
pub fn user_message(query: &str, posts: &[PostContext], max_posts: usize, max_content_chars: usize) -> String {
    let blocks: Vec<String> = posts
        .iter()
        .take(max_posts)
        .map(|post| post_block(post, max_content_chars))
        .collect();

    let context = if blocks.is_empty() {
        "(no posts matched this search)".to_string()
    } else {
        blocks.join(POST_DELIMITER)
    };

    format!("Posts:\n\n{context}\n\nQuestion: {}", query.trim())
}

fn post_block(post: &PostContext, max_content_chars: usize) -> String {
    let mut block = format!(
        "ID: {}\nTitle: {}\nURL: {}\nType: {}\n",
        post.id,
        post.title.trim(),
        post.url,
        post.post_type.as_str()
    );

    if let Some(date) = post.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        block.push_str(&format!("Published: {date}\n"));
    }

    let content = truncate_chars(post.content.trim(), max_content_chars);
    block.push_str(&format!("Content: {content}"));
    block
}

/// System instruction and user message joined into one prompt
pub fn combined_prompt(system: &str, user: &str) -> String {
    format!("{system}\n\n{user}")
}
