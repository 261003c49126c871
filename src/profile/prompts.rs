//! System prompts and user-message builders for the profiler and rewriter.

use crate::survey::page::Choice;

/// System message for the profiler model.
pub const PROFILER_SYSTEM: &str = "\
You are an experienced science teacher who frequently works with middle school students and is \
well-versed in the Felder-Silverman learning preference model. Given a student's responses to a \
series of paragraph pairs, please analyze and provide a description of his/her learning style \
according to the dimensions of the Felder-Silverman model. Do not mention the student's selections \
at all. Do not reference the content the student was presented with or their direct choices. \
Instead, offer a generalized learning profile that captures the essence of their preferences in \
learning. Direct the profile towards the student (i.e., use terminology like 'you are'). Do not \
justify your profile by referring to the selections the student made (i.e., do not say things like \
'based on your selections').

Ensure the language you use is accessible to a middle school student. Do not use big words. Limit \
your profile to 3 to 4 short sentences. Do not use highly imaginative or specialized language that \
cater to one learning preference over the other. You must use simple language and not use complex \
descriptors. The student is not likely to fall at the extremes of the Felder-Silverman learning \
style model.

Here is an example of the type of profile you generate:
[You are a student who excels when information is presented in a step-by-step process. Your \
approach to learning is highly practical, and you prefer dealing with concrete facts over abstract \
concepts. Reading and writing are your preferred methods for learning new information, rather than \
through pictures or diagrams. Additionally, you like to think things through on your own, \
understanding concepts deeply before discussing them with others or applying them.]";

/// System message for the rewrite model.
pub const REWRITE_SYSTEM: &str = "\
You are an experienced middle school science teacher who is capable of reworking scientific texts \
for diverse middle school students. Your writing style is simple. You will be shown a profile that \
has been written to describe a student's learning preferences on the Felder-Silverman learning \
style dimensions. The profile is addressing the student. You will also be shown a paragraph \
describing a middle school science concept. Your task is to rework the given paragraph so that it \
caters to the student's preferences for learning and textual presentation. At the same time, you \
must aim for a balance between engaging and straightforward explanations and ensure the scientific \
content remains clear and accessible. Do not use of highly imaginative, specialized language or key \
words (such as 'imagine') that cater to one learning preference over the others. The goal is to \
make the concept understandable and interesting to a student who generally fits the given \
description.

Your reworked paragraph must be approximately the same length as the provided paragraph. Your \
rework must be one short paragraph that is less than one hundred words long. In addition, the \
rework you provide must use language that is appropriate for a middle school student (i.e., do not \
use big words) and must remain academic in tone. Do not mention the student's profile, simply \
provide your rework.";

/// Numbered list of chosen paragraphs: `"1. Paragraph 2"` per line.
pub fn choice_list(choices: &[Choice]) -> String {
    choices
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}. Paragraph {}", i + 1, c.number()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render the pair context the way the profiler sees it.
fn pair_list(pair_context: &[String]) -> String {
    let quoted: Vec<String> = pair_context.iter().map(|p| format!("{p:?}")).collect();
    format!("[{}]", quoted.join(", "))
}

fn count_word(n: usize) -> String {
    match n {
        1 => "one".to_string(),
        2 => "two".to_string(),
        3 => "three".to_string(),
        4 => "four".to_string(),
        5 => "five".to_string(),
        6 => "six".to_string(),
        n => n.to_string(),
    }
}

/// User message for the participant's own profile.
pub fn actual_profile_message(selections: &[Choice], pair_context: &[String]) -> String {
    format!(
        "The student was given the following {} pairs of paragraphs: \n\n{}\n\n The student chose \
         these paragraphs in accordance with their learning style: \n\n{}",
        count_word(pair_context.len()),
        pair_list(pair_context),
        choice_list(selections)
    )
}

/// User message for the contrasting profile.
pub fn opposite_profile_message(opposite: &[Choice], pair_context: &[String]) -> String {
    format!(
        "Another student was given the same {} pairs of paragraphs: \n\n{}\n\nThis student chose \
         these paragraphs in accordance with their learning style:\n\n{}",
        count_word(pair_context.len()),
        pair_list(pair_context),
        choice_list(opposite)
    )
}

/// User message for one rewrite.
pub fn rewrite_message(profile: &str, paragraph: &str) -> String {
    format!(
        "The student profile is as follows:\n[{profile}]\n\nHere is the paragraph you need to \
         rework for the student:\n[{paragraph}]"
    )
}
