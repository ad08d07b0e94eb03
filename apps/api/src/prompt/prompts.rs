// Prompt fragments for exam-question generation.
// The model is prompted in French; sources are cited in the same
// `Page X of "..."` form the PDF extractor writes into page headers.

pub const PROMPT_HEADER: &str = "Génère des questions d'examen basées sur le contenu suivant :";

pub const CHAPTER_LINE: &str = "Chapitre : {chapter}";

/// Replace `{label}`, `{title}`, `{year}`, `{text}`.
pub const SOURCE_BLOCK: &str = "{label} « {title} » ({year}) :\n{text}";

pub const SINGLE_QUESTION_CLOSING: &str = "\
Génère une seule question d'examen correspondant à un sujet type annales. \
Indique la source de la question au format Page X of \"nom du document\".";

pub const FULL_EXAM_SET_CLOSING: &str = "\
Génère un sujet d'examen complet, composé de plusieurs questions correspondant à des sujets type annales, \
une question par ligne. Pour chaque question, indique sa source au format Page X of \"nom du document\".";
