//! Lead classification for pre-event reminders: which reminders deserve
//! advance alerts, which fire only at the hour, and which events are far
//! enough out to get the automatic 24h-before alert.

use mordomo_parse::normalize::normalize;

/// Events more than this far out always get one 24h-before alert.
pub const LONG_EVENT_THRESHOLD_SECS: i64 = 5 * 86_400;
/// The automatic lead used when the user configured none.
pub const AUTO_LEAD_SECONDS: i64 = 86_400;

/// Commitments with an arrival time: meetings, appointments, transport,
/// formal events. Matched as substrings over the normalised message.
const NEED_ADVANCE_KEYWORDS: &[&str] = &[
    // Meetings and work
    "reuniao", "meeting", "apresentacao", "presentation", "entrevista", "interview",
    "conferencia", "conference", "palestra", "workshop", "seminario", "webinar", "standup",
    "daily", "retrospectiva", "planning", "sprint", "deadline", "prazo de entrega",
    // Health appointments
    "consulta", "medico", "doutor", "doctor", "clinica", "hospital", "exame", "vacina",
    "dentista", "fisioterapia", "terapia", "psicologo", "psicologa", "oftalmologista",
    "cardiologista", "dermatologista", "pediatra", "cirurgia", "operacao", "surgery",
    // Travel and transport
    "voo", "flight", "embarque", "check-in", "checkin", "aeroporto", "airport", "onibus",
    "autocarro", "barco", "ferry", "comboio", "trem", "train", "estacao", "metro", "viagem",
    "trip", "transfer", "translado",
    // Social events and commitments
    "encontro", "meetup", "compromisso", "appointment", "casamento", "wedding", "cerimonia",
    "festa", "party", "aniversario", "birthday", "formatura", "graduation", "visita",
    // Education
    "prova", "exam", "avaliacao", "aula", "class", "curso", "defesa", "matricula",
    // External services
    "cabeleireiro", "haircut", "barbearia", "manicure", "advogado", "cartorio", "vistoria",
    "inspecao", "test drive", "mudanca", "audicao", "audition", "casting",
    // Sports, culture, classes
    "jogo", "game", "partida", "cinema", "teatro", "espetaculo", "show", "concerto",
    "exposicao", "museu", "festival", "treino", "academia", "ginasio", "gym", "yoga",
    "pilates", "personal trainer", "nutricionista", "veterinario", "aula de conducao",
    "aula de direcao", "driving lesson", "passaporte", "visto", "consulado", "embaixada",
    "assembleia", "reuniao de pais", "inauguracao",
];

/// Things that happen "at the hour": medication, routines, calls, chores.
/// Checked first so "tomar remédio antes da consulta" stays a plain reminder.
const NO_ADVANCE_KEYWORDS: &[&str] = &[
    // Medication and routine health
    "tomar remedio", "tomar medicamento", "tomar medicacao", "tomar comprimido", "comprimido",
    "pill", "take medicine", "tomar antibiotico", "tomar vitamina", "vitamina", "suplemento",
    "insulina", "glicemia", "colirio", "aspirina", "paracetamol", "ibuprofeno", "dipirona",
    "beber agua", "drink water", "hidratar", "alongar", "alongamento", "respirar", "meditar",
    "medir pressao", "dormir", "acordar", "wake up", "despertar",
    // Household routines
    "lavar louca", "lavar roupa", "passar roupa", "varrer", "aspirar", "limpar", "arrumar",
    "tirar lixo", "lixo", "reciclagem", "regar", "comida do gato", "comida do cao",
    "feed the cat", "feed the dog", "trocar areia",
    // Calls and messages
    "ligar", "telefonar", "phone call", "enviar email", "mandar email", "send email",
    "mandar mensagem", "send message", "retornar ligacao",
    // Payments and admin chores
    "pagar conta", "pay bill", "boleto", "pix", "transferencia", "pagamento", "recarga",
    // Shopping errands
    "comprar", "mercado", "supermercado", "grocery", "farmacia", "buscar remedio",
    "retirar encomenda", "pick up package", "correio",
    // Desk tasks
    "enviar relatorio", "submit report", "enviar proposta", "enviar orcamento", "revisar",
    "estudar", "study", "ler", "read", "backup",
    // Personal routines
    "cafe da manha", "breakfast", "lanche", "banho", "shower", "escovar os dentes",
    "escovar dentes", "brush teeth", "exercicio", "workout", "corrida", "caminhada",
    "assistir", "watch", "verificar", "check", "desligar", "apagar luz", "tirar do forno",
    "trocar fralda", "fralda", "mamada", "amamentar", "soneca", "nap", "cochilo",
    "tomar cha", "cafe", "coffee", "tomar sol", "protetor solar", "cortar unha",
    "trocar lencol", "pausa", "break", "postura", "levantar", "anotar", "nao esquecer",
    "trocar lampada", "carregar celular", "charge phone", "jejum", "medir temperatura",
    "trocar curativo", "curativo",
];

pub fn is_long_duration(in_seconds: i64) -> bool {
    in_seconds > LONG_EVENT_THRESHOLD_SECS
}

/// Keyword side of the classifier. `Some(true)` = needs advance alerts,
/// `Some(false)` = at-the-hour only, `None` = neither list matched and the
/// parser LLM gets the call.
pub fn keyword_verdict(message: &str) -> Option<bool> {
    let t = normalize(message);
    if t.is_empty() {
        return None;
    }
    // No-advance wins so medication-before-an-appointment stays plain.
    if NO_ADVANCE_KEYWORDS.iter().any(|k| t.contains(k)) {
        return Some(false);
    }
    if NEED_ADVANCE_KEYWORDS.iter().any(|k| t.contains(k)) {
        return Some(true);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commitments_need_advance() {
        assert_eq!(keyword_verdict("reunião com o João"), Some(true));
        assert_eq!(keyword_verdict("consulta no dentista"), Some(true));
        assert_eq!(keyword_verdict("voo para Lisboa"), Some(true));
    }

    #[test]
    fn routines_do_not() {
        assert_eq!(keyword_verdict("tomar remédio"), Some(false));
        assert_eq!(keyword_verdict("beber água"), Some(false));
        assert_eq!(keyword_verdict("ligar para a mãe"), Some(false));
    }

    #[test]
    fn no_advance_wins_over_advance() {
        // Medication before an appointment is still at-the-hour only.
        assert_eq!(keyword_verdict("tomar remédio antes da consulta"), Some(false));
    }

    #[test]
    fn unknown_topics_are_ambiguous() {
        assert_eq!(keyword_verdict("coisa do zé"), None);
        assert_eq!(keyword_verdict(""), None);
    }

    #[test]
    fn long_events_cross_five_days() {
        assert!(is_long_duration(6 * 86_400));
        assert!(!is_long_duration(4 * 86_400));
    }
}
