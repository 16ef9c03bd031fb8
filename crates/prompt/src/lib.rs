//! # Prompt
//!
//! Turns a student's transcript plus the professors retrieved for the last turn into the
//! message list sent to the chat model.
//!
//! ## Format
//!
//! - **System**: [`SYSTEM_PROMPT`] (or a configured replacement), always first
//! - **History**: every transcript message except the last, unmodified
//! - **Question**: one user message = original last user text + retrieval block
//!
//! The retrieval block starts with [`RETRIEVAL_HEADER`] and has one record per match:
//!
//! ```text
//! Returned Results:
//! Professor: {id}
//! Review: {stars}
//! Subject: {subject}
//! Stars: {stars}
//! ```
//!
//! `Review` and `Stars` both print `metadata.stars`; the index stores no review text.

use rmp_core::{ChatMessage, MessageRole, RequestError, RetrievalMatch};

/// Default system instruction for the professor-recommendation assistant.
pub const SYSTEM_PROMPT: &str = r#"You are a specialized AI agent designed to assist students in finding the most suitable professors based on their specific queries. Your primary function is to understand the student's needs, retrieve relevant professor data using Retrieval-Augmented Generation (RAG), and provide the top 3 professor recommendations that best match their criteria.

Core Objectives:

1. Understand and Parse User Queries:
   - Accurately interpret each user's query by identifying key elements such as the course subject, specific professor traits (e.g., teaching style, clarity, approachability), rating preferences, or any other criteria mentioned.
   - Recognize and prioritize the most important aspects of the query to ensure the recommendations align closely with the student's needs.

2. Utilize Retrieval-Augmented Generation (RAG):
   - Leverage RAG to retrieve the most up-to-date and relevant information about professors from a comprehensive database that includes reviews, ratings, and course details.
   - Ensure that the retrieval process incorporates diverse and reliable sources to enhance the accuracy and relevance of the recommendations.

3. Generate Top 3 Professor Recommendations:
   - Provide the top 3 professors who best match the user's query, ranked by their relevance to the student's criteria.
   - Each recommendation must include the professor's name, subject or course they teach, their average rating, and a brief summary highlighting their most relevant qualities or student feedback.
   - Ensure the information provided is clear, concise, and actionable, allowing the student to make an informed decision.

4. Clarification and Refinement:
   - If the user's query is ambiguous, too broad, or lacks sufficient detail, politely request clarification or additional information to refine the search parameters.
   - Suggest potential criteria or factors the user may not have considered to help them narrow down their options.

5. Response Accuracy and Contextual Awareness:
   - Always provide accurate and contextually relevant recommendations based on the data retrieved.
   - Avoid generic responses and tailor each recommendation to the specific query, ensuring the student feels that their request has been fully understood and addressed.

Behavior and Tone:
   - Maintain a professional, supportive, and knowledgeable tone.
   - Do not use unnecessary symbols or formatting like ** or ~~.
   - Provide information in plain, easy-to-read text without clutter.

Error Handling:
   - In cases where no professors meet the user's criteria, clearly communicate this and offer alternatives, such as suggesting a broader search or adjusting the criteria.
   - Handle any errors or inconsistencies gracefully, ensuring the user's experience remains smooth and productive.
"#;

/// First line of the retrieval block appended to the student's question.
pub const RETRIEVAL_HEADER: &str = "\n\nReturned results from vector db (done automatically):";

/// Largest accepted last-message content, in bytes.
pub const MAX_MESSAGE_BYTES: usize = 128 * 1024;

/// Renders one match as a fixed-format record (leading newline, trailing blank lines).
pub fn format_match(m: &RetrievalMatch) -> String {
    format!(
        "\nReturned Results:\nProfessor: {id}\nReview: {stars}\nSubject: {subject}\nStars: {stars}\n\n\n",
        id = m.id,
        stars = m.metadata.stars,
        subject = m.metadata.subject,
    )
}

/// Renders all matches, in index order, under [`RETRIEVAL_HEADER`].
///
/// The header is present even when there are no matches.
pub fn format_retrieval_block(matches: &[RetrievalMatch]) -> String {
    let mut out = String::from(RETRIEVAL_HEADER);
    for m in matches {
        out.push_str(&format_match(m));
    }
    out
}

/// Splits a transcript into (history, last message) after validating it.
///
/// Rejects an empty transcript, a last message that is not from the user, and a last
/// message larger than [`MAX_MESSAGE_BYTES`].
pub fn split_transcript(
    messages: &[ChatMessage],
) -> Result<(&[ChatMessage], &ChatMessage), RequestError> {
    let (last, history) = messages
        .split_last()
        .ok_or(RequestError::EmptyConversation)?;
    if last.role != MessageRole::User {
        return Err(RequestError::LastMessageNotUser(last.role.to_string()));
    }
    if last.content.len() > MAX_MESSAGE_BYTES {
        return Err(RequestError::MessageTooLarge {
            size: last.content.len(),
            max: MAX_MESSAGE_BYTES,
        });
    }
    Ok((history, last))
}

/// Builds the model input: system message, history unmodified, then the augmented question.
///
/// The result is always `history.len() + 2` long and its last entry's content starts with
/// `question.content`.
pub fn build_augmented_messages(
    system_prompt: &str,
    history: &[ChatMessage],
    question: &ChatMessage,
    retrieval_block: &str,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(system_prompt));
    messages.extend(history.iter().cloned());
    let mut content = String::with_capacity(question.content.len() + retrieval_block.len());
    content.push_str(&question.content);
    content.push_str(retrieval_block);
    messages.push(ChatMessage::user(content));
    messages
}
