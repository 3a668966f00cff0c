//! Built-in word lists: the common-word corpus and default character names
//! that make up the base whitelist, and the lemma table used to fold
//! inflected forms onto one index key.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;

// ---------------------------------------------------------------------------
// Common words
// ---------------------------------------------------------------------------

pub static COMMON_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // Articles, determiners, pronouns
        "a", "an", "the", "this", "that", "these", "those", "some", "any", "each", "every",
        "all", "both", "few", "many", "much", "more", "most", "other", "another", "such", "no",
        "i", "me", "my", "mine", "myself", "you", "your", "yours", "yourself", "he", "him",
        "his", "himself", "she", "her", "hers", "herself", "it", "its", "itself", "we", "us",
        "our", "ours", "ourselves", "they", "them", "their", "theirs", "themselves", "what",
        "which", "who", "whom", "whose", "one", "ones", "something", "nothing", "anything",
        "everything", "someone", "anyone", "everyone", "nobody",
        // Prepositions, conjunctions
        "and", "or", "but", "nor", "so", "yet", "if", "then", "than", "because", "while",
        "though", "although", "as", "at", "by", "for", "from", "in", "into", "of", "off", "on",
        "onto", "out", "over", "to", "up", "down", "with", "without", "about", "above", "below",
        "after", "before", "between", "through", "under", "around", "against", "along",
        "across", "behind", "beside", "near", "toward", "towards", "upon", "within", "until",
        // Auxiliaries and very common verbs
        "be", "is", "am", "are", "was", "were", "been", "being", "have", "has", "had", "having",
        "do", "does", "did", "doing", "done", "will", "would", "shall", "should", "can",
        "could", "may", "might", "must", "get", "gets", "got", "go", "goes", "went", "gone",
        "make", "makes", "made", "say", "says", "said", "know", "knew", "think", "thought",
        "take", "took", "see", "saw", "come", "came", "want", "look", "looked", "use", "find",
        "give", "gave", "tell", "told", "let", "put", "keep", "seem", "seemed", "feel", "felt",
        // Adverbs and fillers
        "not", "just", "also", "very", "too", "only", "still", "even", "now", "here", "there",
        "when", "where", "why", "how", "again", "ever", "never", "always", "often", "already",
        "back", "away", "well", "really", "quite", "almost", "perhaps", "maybe", "yes",
        "oh", "ah", "okay", "ok",
        // Contractions
        "i'm", "you're", "he's", "she's", "it's", "we're", "they're", "i've", "you've",
        "we've", "they've", "i'll", "you'll", "he'll", "she'll", "we'll", "they'll", "i'd",
        "you'd", "he'd", "she'd", "we'd", "they'd", "don't", "doesn't", "didn't", "isn't",
        "aren't", "wasn't", "weren't", "can't", "couldn't", "won't", "wouldn't", "shouldn't",
        "that's", "there's", "what's", "let's",
        // Very common nouns and adjectives
        "time", "way", "day", "thing", "things", "man", "woman", "people", "hand",
        "hands", "eye", "eyes", "head", "face", "room", "door", "good", "new", "first", "last",
        "long", "little", "own", "old", "right", "big", "same", "next", "two", "three",
    ]
    .into_iter()
    .collect()
});

// ---------------------------------------------------------------------------
// Default names
// ---------------------------------------------------------------------------

/// Frequent roleplay character names. A phrase made only of names and common
/// words carries no stylistic signal.
pub static DEFAULT_NAMES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "elara", "lyra", "kael", "aria", "seraphina", "elias", "alex", "sam", "max", "luna",
        "mira", "kira", "zara", "nova", "iris", "jace", "ryder", "liam", "ethan", "noah",
        "oliver", "lucas", "leo", "finn", "emma", "olivia", "ava", "mia", "chloe", "sophie",
        "lily", "grace", "ella", "rose", "jack", "john", "james", "william", "thomas", "anna",
        "sarah", "marcus", "victor", "adrian", "damien", "lucien", "gideon", "silas", "evelyn",
        "isabella", "selene", "aurora", "raven", "ember", "ash", "rowan", "sage", "orion",
        "thorne", "vex", "vax",
    ]
    .into_iter()
    .collect()
});

// ---------------------------------------------------------------------------
// Lemmas
// ---------------------------------------------------------------------------

static LEMMAS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        // be / have / do
        ("is", "be"), ("am", "be"), ("are", "be"), ("was", "be"), ("were", "be"),
        ("been", "be"), ("being", "be"), ("has", "have"), ("had", "have"),
        ("having", "have"), ("does", "do"), ("did", "do"), ("done", "do"), ("doing", "do"),
        // irregular verbs
        ("went", "go"), ("goes", "go"), ("gone", "go"), ("going", "go"),
        ("made", "make"), ("makes", "make"), ("making", "make"),
        ("said", "say"), ("says", "say"), ("saying", "say"),
        ("took", "take"), ("taken", "take"), ("takes", "take"), ("taking", "take"),
        ("saw", "see"), ("seen", "see"), ("sees", "see"), ("seeing", "see"),
        ("came", "come"), ("comes", "come"), ("coming", "come"),
        ("knew", "know"), ("known", "know"), ("knows", "know"),
        ("thought", "think"), ("thinks", "think"), ("thinking", "think"),
        ("felt", "feel"), ("feels", "feel"), ("feeling", "feel"),
        ("gave", "give"), ("given", "give"), ("gives", "give"),
        ("told", "tell"), ("tells", "tell"),
        ("got", "get"), ("gets", "get"), ("getting", "get"), ("gotten", "get"),
        ("found", "find"), ("finds", "find"),
        ("held", "hold"), ("holds", "hold"), ("holding", "hold"),
        ("stood", "stand"), ("stands", "stand"), ("standing", "stand"),
        ("sat", "sit"), ("sits", "sit"), ("sitting", "sit"),
        ("ran", "run"), ("runs", "run"), ("running", "run"),
        ("began", "begin"), ("begun", "begin"), ("begins", "begin"),
        ("spoke", "speak"), ("spoken", "speak"), ("speaks", "speak"),
        ("grew", "grow"), ("grown", "grow"), ("grows", "grow"),
        ("drew", "draw"), ("drawn", "draw"), ("draws", "draw"),
        ("left", "leave"), ("leaves", "leave"), ("leaving", "leave"),
        ("kept", "keep"), ("keeps", "keep"),
        ("brought", "bring"), ("brings", "bring"),
        ("caught", "catch"), ("catches", "catch"),
        ("fell", "fall"), ("fallen", "fall"), ("falls", "fall"),
        ("rose", "rise"), ("risen", "rise"), ("rises", "rise"),
        ("shook", "shake"), ("shaken", "shake"), ("shakes", "shake"),
        ("swept", "sweep"), ("sweeps", "sweep"),
        ("sent", "send"), ("sends", "send"),
        ("met", "meet"), ("meets", "meet"),
        ("hung", "hang"), ("hangs", "hang"),
        ("lay", "lie"), ("lies", "lie"), ("lying", "lie"),
        ("bit", "bite"), ("bitten", "bite"), ("bites", "bite"),
        // regular verbs common in narration
        ("walked", "walk"), ("walks", "walk"), ("walking", "walk"),
        ("looked", "look"), ("looks", "look"), ("looking", "look"),
        ("smiled", "smile"), ("smiles", "smile"), ("smiling", "smile"),
        ("whispered", "whisper"), ("whispers", "whisper"), ("whispering", "whisper"),
        ("glanced", "glance"), ("glances", "glance"), ("glancing", "glance"),
        ("shivered", "shiver"), ("shivers", "shiver"), ("shivering", "shiver"),
        ("sighed", "sigh"), ("sighs", "sigh"), ("sighing", "sigh"),
        ("nodded", "nod"), ("nods", "nod"), ("nodding", "nod"),
        ("leaned", "lean"), ("leans", "lean"), ("leaning", "lean"),
        ("turned", "turn"), ("turns", "turn"), ("turning", "turn"),
        ("reached", "reach"), ("reaches", "reach"), ("reaching", "reach"),
        ("pressed", "press"), ("presses", "press"), ("pressing", "press"),
        ("traced", "trace"), ("traces", "trace"), ("tracing", "trace"),
        ("narrowed", "narrow"), ("narrows", "narrow"), ("narrowing", "narrow"),
        ("widened", "widen"), ("widens", "widen"), ("widening", "widen"),
        ("tightened", "tighten"), ("tightens", "tighten"), ("tightening", "tighten"),
        ("crackled", "crackle"), ("crackles", "crackle"), ("crackling", "crackle"),
        ("flickered", "flicker"), ("flickers", "flicker"), ("flickering", "flicker"),
        ("smirked", "smirk"), ("smirks", "smirk"), ("smirking", "smirk"),
        ("murmured", "murmur"), ("murmurs", "murmur"), ("murmuring", "murmur"),
        ("gleamed", "gleam"), ("gleams", "gleam"), ("gleaming", "gleam"),
        ("hummed", "hum"), ("hums", "hum"), ("humming", "hum"),
        ("echoed", "echo"), ("echoes", "echo"), ("echoing", "echo"),
        // nouns
        ("eyes", "eye"), ("hands", "hand"), ("fingers", "finger"), ("shoulders", "shoulder"),
        ("lips", "lip"), ("cheeks", "cheek"), ("voices", "voice"), ("spines", "spine"),
        ("shadows", "shadow"), ("walls", "wall"), ("doors", "door"), ("rooms", "room"),
        ("men", "man"), ("women", "woman"), ("children", "child"), ("feet", "foot"),
        ("teeth", "tooth"), ("knives", "knife"), ("lives", "life"), ("wolves", "wolf"),
    ]
    .into_iter()
    .collect()
});

/// Dictionary lemma for `token`, or `None` when the word is already a base
/// form or is unknown.
pub fn lemma_of(token: &str) -> Option<&'static str> {
    LEMMAS.get(token).copied()
}
