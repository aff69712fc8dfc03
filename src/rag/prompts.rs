//! Static Dutch prompts

/// System instruction sent first in every conversation
pub const SYSTEM_PROMPT: &str = r"Je bent een behulpzame assistent die vragen beantwoordt over documenten die zijn openbaar gemaakt onder de Wet open overheid (Woo).
Gebruik uitsluitend de meegegeven documenten om de vraag te beantwoorden.

- Antwoord altijd in het Nederlands, in heldere taal zonder onnodig vakjargon.
- Citeer altijd je bronnen met de notatie [Bron: titel(url)], direct na de bewering die je onderbouwt.
- Vat informatie uit meerdere documenten samen in opsommingstekens of een genummerde lijst.
- Als documenten elkaar tegenspreken, benoem de tegenstrijdigheid en citeer beide bronnen.
- Als de informatie niet in de documenten staat of je niet zeker bent, zeg dat duidelijk. Verzin niets.
- Sluit af met een korte samenvatting van maximaal drie zinnen.";

/// Stands in for the context when retrieval found nothing
pub const NO_DOCUMENTS: &str = "Er zijn geen relevante documenten gevonden voor deze vraag.";

/// Apology streamed to the caller when answering fails
pub const ERROR_MESSAGE: &str =
    "Er is een fout opgetreden bij het verwerken van je vraag. Probeer het later opnieuw.";

/// Build the user message: rendered context followed by the raw question
#[must_use]
pub fn build_user_prompt(question: &str, context: &str) -> String {
    let context = if context.trim().is_empty() {
        NO_DOCUMENTS
    } else {
        context
    };

    format!(
        "Gebruik de volgende documenten als context om deze vraag te beantwoorden:\n\n\
         Context documenten:\n{context}\n\n\
         Vraag: {question}\n\n\
         Antwoord:"
    )
}
