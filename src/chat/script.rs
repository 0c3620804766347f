//! Scripted qualification dialogue: stage→field and stage→prompt tables.

use std::sync::LazyLock;

use regex::Regex;

/// Stage at which the scripted phase is over and freeform chat begins.
pub const FREEFORM_STAGE: u8 = 7;

/// Typed when the widget is opened for the first time in a session.
pub const GREETING: &str = "👋 Opa! Antes de personalizar sua automação, me diz rapidinho:\n\nVocê já usa automação ou está começando do zero?";

/// Typed after the last scripted answer.
pub const SCRIPT_CLOSING: &str = "Perfeito 👌 Agora é só clicar em Iniciar diagnóstico no site!";

/// Typed after the assistant reply when the user signals intent to buy.
pub const PURCHASE_CLOSING: &str =
    "Show! 🤝 Para continuar use o botão Iniciar diagnóstico ou acesse /checkout no site.";

/// Shown in place of an assistant reply when the chat endpoint fails.
pub const FAILURE_MESSAGE: &str = "😅 Algo deu ruim — tenta de novo!";

static CLOSING_INTENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(fechar|contratar|link|checkout|começar|ativar|onde pago|assinar|pagar)")
        .expect("closing-intent pattern is valid")
});

/// Field a reply given at `stage` is stored under.
pub fn field_for_stage(stage: u8) -> Option<&'static str> {
    match stage {
        1 => Some("automacao"),
        2 => Some("segmento"),
        3 => Some("canal"),
        4 => Some("volume"),
        5 => Some("objetivo"),
        6 => Some("urgencia"),
        _ => None,
    }
}

/// Question asked on entering `stage`. Stage 1's question is part of the
/// greeting; stage 7 has no question.
pub fn prompt_for_stage(stage: u8) -> Option<&'static str> {
    match stage {
        2 => Some("Boa! Qual o segmento do seu negócio? (ex: estética, loja, infoproduto, restaurante...)"),
        3 => Some("Legal. Hoje onde chegam mais mensagens? WhatsApp, Insta, site…?"),
        4 => Some("Show. Quantas pessoas te chamam por dia em média?"),
        5 => Some("E qual objetivo principal agora? (vendas, atendimento, agendamento, suporte…)"),
        6 => Some("Última: pretende implementar quando?"),
        _ => None,
    }
}

/// Whether a freeform message signals intent to purchase or close.
pub fn is_closing_intent(message: &str) -> bool {
    CLOSING_INTENT.is_match(message)
}
