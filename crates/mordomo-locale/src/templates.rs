//! User-facing templates in the four supported languages.
//!
//! Wording mirrors the production phrasing the user base already knows;
//! `{placeholders}` are filled by the caller with `format!`-style helpers
//! below. Never include secrets, stack traces, or internal ids beyond the
//! short job id.

use crate::lang::Lang;

pub fn language_switch_confirmation(lang: Lang) -> &'static str {
    match lang {
        Lang::PtPt => "Combinado, daqui em diante falo em português de Portugal. 📋",
        Lang::PtBr => "Beleza! A partir de agora falo em português do Brasil. 📋",
        Lang::Es => "¡De acuerdo! A partir de ahora hablo en español. 📋",
        Lang::En => "Sure! From now on I'll speak in English. 📋",
    }
}

pub fn language_already_active(lang: Lang) -> &'static str {
    match lang {
        Lang::PtPt => "Já estamos em português de Portugal! 😊",
        Lang::PtBr => "Já estamos em português do Brasil! 😊",
        Lang::Es => "¡Ya estamos en español! 😊",
        Lang::En => "We're already in English! 😊",
    }
}

pub fn preferred_name_question(lang: Lang) -> &'static str {
    match lang {
        Lang::PtPt => "Como gostaria que eu te chamasse?",
        Lang::PtBr => "Como você gostaria que eu te chamasse?",
        Lang::Es => "¿Cómo te gustaría que te llamara?",
        Lang::En => "What would you like me to call you?",
    }
}

pub fn preferred_name_confirmation(lang: Lang, name: &str) -> String {
    match lang {
        Lang::PtPt => format!("Obrigado! A partir de agora vou chamar-te {name}. 📋"),
        Lang::PtBr => format!("Valeu! A partir de agora vou te chamar de {name}. 📋"),
        Lang::Es => format!("¡Gracias! A partir de ahora te llamaré {name}. 📋"),
        Lang::En => format!("Thanks! I'll call you {name} from now on. 📋"),
    }
}

pub fn onboarding_intro(lang: Lang) -> &'static str {
    match lang {
        Lang::PtPt => "Olá! Sou a tua assistente de organização — listas, lembretes e agenda. 📋",
        Lang::PtBr => "Oi! Sou sua assistente de organização — listas, lembretes e agenda. 📋",
        Lang::Es => "¡Hola! Soy tu asistente de organización — listas, recordatorios y agenda. 📋",
        Lang::En => "Hi! I'm your organization assistant — lists, reminders and agenda. 📋",
    }
}

pub fn onboarding_ask_city_or_time(lang: Lang) -> &'static str {
    match lang {
        Lang::PtPt => "Para enviar os lembretes na hora certa, preciso saber onde estás. Em que cidade vives? (Ou diz-me que horas são aí agora.)",
        Lang::PtBr => "Para enviar os lembretes na hora certa, preciso saber onde você está. Em que cidade você mora? (Ou me diga que horas são aí agora.)",
        Lang::Es => "Para enviar los recordatorios a la hora correcta, necesito saber dónde estás. ¿En qué ciudad vives? (O dime qué hora es ahí ahora.)",
        Lang::En => "To send reminders at the right time, I need to know where you are. Which city do you live in? (Or tell me what time it is there now.)",
    }
}

pub fn onboarding_ask_time_fallback(lang: Lang) -> &'static str {
    match lang {
        Lang::PtPt => "Que horas são aí agora? (Assim acerto o fuso dos teus lembretes.)",
        Lang::PtBr => "Que horas são aí agora? (Assim acerto o fuso dos seus lembretes.)",
        Lang::Es => "¿Qué hora es ahí ahora? (Así ajusto el huso de tus recordatorios.)",
        Lang::En => "What time is it there now? (So I can set your reminder times right.)",
    }
}

pub fn onboarding_time_confirm(lang: Lang, date_str: &str, time_str: &str) -> String {
    match lang {
        Lang::PtPt | Lang::PtBr => format!("Ah, {date_str}, {time_str}. Confere?"),
        Lang::Es => format!("Ah, {date_str}, {time_str}. ¿Confirma?"),
        Lang::En => format!("So, {date_str}, {time_str}. Correct?"),
    }
}

pub fn onboarding_tz_set_from_time(lang: Lang) -> &'static str {
    match lang {
        Lang::PtPt => "Fuso definido. Podes mudar quando quiseres com /tz ou /fuso.",
        Lang::PtBr => "Fuso definido. Você pode mudar quando quiser com /tz ou /fuso.",
        Lang::Es => "Huso definido. Puedes cambiar cuando quieras con /tz o /fuso.",
        Lang::En => "Timezone set. You can change anytime with /tz or /fuso.",
    }
}

pub fn onboarding_complete(lang: Lang) -> &'static str {
    match lang {
        Lang::PtPt => "Tudo certo! ✨ Já podes pedir lembretes, listas e eventos. Qualquer coisa, diz. 😊",
        Lang::PtBr => "Beleza! ✨ Já pode pedir lembretes, listas e eventos. Qualquer coisa, manda mensagem. 😊",
        Lang::Es => "¡Listo! ✨ Ya puedes pedir recordatorios, listas y eventos. Cualquier cosa, dilo. 😊",
        Lang::En => "All set! ✨ You can ask for reminders, lists and events. Anything else, just say. 😊",
    }
}

pub fn onboarding_invalid_response(lang: Lang) -> &'static str {
    match lang {
        Lang::PtPt => "Não percebi. Responde à pergunta ou diz 'pular' para avançar.",
        Lang::PtBr => "Não entendi. Responda à pergunta ou diga 'pular' para avançar.",
        Lang::Es => "No entendí. Responde la pregunta o di 'saltar' para seguir.",
        Lang::En => "I didn't get that. Answer the question or say 'skip' to continue.",
    }
}

pub fn nudge_tz_when_missing(lang: Lang) -> &'static str {
    match lang {
        Lang::PtPt => "Quando puderes, diz a tua cidade ou que horas são aí para os lembretes chegarem na hora. 😊",
        Lang::PtBr => "Quando puder, diga sua cidade ou que horas são aí para os lembretes chegarem na hora. 😊",
        Lang::Es => "Cuando puedas, dime tu ciudad o qué hora es ahí para que los recordatorios lleguen a tiempo. 😊",
        Lang::En => "When you can, tell me your city or what time it is there so reminders arrive on time. 😊",
    }
}

pub const OUT_OF_SCOPE_FALLBACKS_PT_PT: &[&str] = &[
    "Esse assunto foge ao que consigo fazer, mas adorava ajudar noutra coisa! 😊 Organizo lembretes e listas. Podes digitar /help para ver a lista de comandos, ou falar por mensagem/áudio.",
    "Não tenho superpoderes para isso. Posso ajudar com lembretes e listas. Digita /help para ver os comandos; ou escreve/envia áudio.",
    "Isso fica fora da minha zona. Foco: organizar teu tempo. Digita /help para ver tudo; podes escrever ou mandar áudio.",
];
pub const OUT_OF_SCOPE_FALLBACKS_PT_BR: &[&str] = &[
    "Esse assunto foge do que consigo fazer, mas adoraria ajudar em outra coisa! 😊 Organizo lembretes e listas. Você pode digitar /help para ver a lista de comandos, ou falar por mensagem ou áudio.",
    "Não tenho superpoderes para isso. Posso ajudar com lembretes e listas. Digite /help para ver os comandos; ou escreva/envie áudio.",
    "Isso fica fora da minha área. Foco: organizar seu tempo. Digite /help para ver tudo; pode escrever ou mandar áudio.",
];
pub const OUT_OF_SCOPE_FALLBACKS_ES: &[&str] = &[
    "Ese tema se sale de lo que puedo hacer, ¡pero me encantaría ayudarte! 😊 Organizo recordatorios y listas. Puedes escribir /help para ver la lista de comandos, o hablarme por mensaje o audio.",
    "No tengo superpoderes para eso. Ayudo con recordatorios y listas. Escribe /help para ver los comandos; o escribe/envía audio.",
    "Eso se sale de mi zona. Foco: organizar tu tiempo. Escribe /help para ver todo; puedes escribir o mandar audio.",
];
pub const OUT_OF_SCOPE_FALLBACKS_EN: &[&str] = &[
    "That's outside what I can do, but I'd love to help with something else! 😊 I do reminders and lists. You can type /help to see the list of commands, or message me / send audio.",
    "I don't have superpowers for that. I help with reminders and lists. Type /help to see the commands; or type/send audio.",
    "That's outside my lane. I focus on organising your time. Type /help to see everything; you can type or send audio.",
];

pub fn out_of_scope_fallbacks(lang: Lang) -> &'static [&'static str] {
    match lang {
        Lang::PtPt => OUT_OF_SCOPE_FALLBACKS_PT_PT,
        Lang::PtBr => OUT_OF_SCOPE_FALLBACKS_PT_BR,
        Lang::Es => OUT_OF_SCOPE_FALLBACKS_ES,
        Lang::En => OUT_OF_SCOPE_FALLBACKS_EN,
    }
}

pub fn injection_refusal(lang: Lang) -> &'static str {
    match lang {
        Lang::PtPt => "Mantenho o meu papel de assistente de lembretes e listas. Se precisares de agendar algo ou organizar o dia a dia, estou aqui. 😊",
        Lang::PtBr => "Mantenho meu papel de assistente de lembretes e listas. Se precisar agendar algo ou organizar o dia a dia, estou aqui. 😊",
        Lang::Es => "Mantengo mi rol de asistente de recordatorios y listas. Si necesitas agendar algo o organizar el día a día, aquí estoy. 😊",
        Lang::En => "I keep my role as a reminders and lists assistant. If you need to schedule something or organise your day, I'm here. 😊",
    }
}

pub fn blocked_command_refusal(lang: Lang) -> &'static str {
    match lang {
        Lang::PtPt => "Não consigo processar esse conteúdo. Se precisares de lembretes ou listas, estou aqui. 😊",
        Lang::PtBr => "Não consigo processar esse conteúdo. Se precisar de lembretes ou listas, estou aqui. 😊",
        Lang::Es => "No puedo procesar ese contenido. Si necesitas recordatorios o listas, aquí estoy. 😊",
        Lang::En => "I can't process that content. If you need reminders or lists, I'm here. 😊",
    }
}

pub fn rate_limited(lang: Lang) -> &'static str {
    match lang {
        Lang::PtPt => "Muitas mensagens. Aguarda um minuto antes de enviar de novo.",
        Lang::PtBr => "Muitas mensagens. Aguarde um minuto antes de enviar de novo.",
        Lang::Es => "Demasiados mensajes. Espera un minuto antes de enviar de nuevo.",
        Lang::En => "Too many messages. Wait a minute before sending again.",
    }
}

pub fn degraded_service(lang: Lang) -> &'static str {
    match lang {
        Lang::PtPt => "Estou com o serviço temporariamente limitado. Os comandos (/help) continuam a funcionar. 🙏",
        Lang::PtBr => "Estou com o serviço temporariamente limitado. Os comandos (/help) continuam funcionando. 🙏",
        Lang::Es => "El servicio está temporalmente limitado. Los comandos (/help) siguen funcionando. 🙏",
        Lang::En => "Service is temporarily limited. Commands (/help) still work. 🙏",
    }
}

pub fn calling_ack(lang: Lang) -> &'static str {
    match lang {
        Lang::PtPt | Lang::PtBr => "Estou aqui! O que precisa?",
        Lang::Es => "¡Aquí! ¿Qué necesitas?",
        Lang::En => "Here! What do you need?",
    }
}

pub fn reminder_ask_what(lang: Lang) -> &'static str {
    match lang {
        Lang::PtPt | Lang::PtBr => "De que é o lembrete? Por exemplo: ir à farmácia, tomar o remédio, reunião com o João, buscar as crianças...",
        Lang::Es => "¿De qué es el recordatorio? Por ejemplo: ir a la farmacia, tomar la medicina, reunión con Juan...",
        Lang::En => "What's the reminder for? E.g.: go to the pharmacy, take medicine, meeting with John, pick up the kids...",
    }
}

pub fn reminder_min_interval_2h(lang: Lang) -> &'static str {
    match lang {
        Lang::PtPt | Lang::PtBr => "O intervalo mínimo para lembretes recorrentes é 2 horas. Ex.: a cada 2 horas ou a cada 3 horas.",
        Lang::Es => "El intervalo mínimo para recordatorios recurrentes es 2 horas. Ej.: cada 2 horas o cada 3 horas.",
        Lang::En => "The minimum interval for recurring reminders is 2 hours. E.g. every 2 hours or every 3 hours.",
    }
}

pub fn reminder_min_interval_30min(lang: Lang) -> &'static str {
    match lang {
        Lang::PtPt | Lang::PtBr => "O intervalo mínimo para lembretes recorrentes é 30 minutos. Ex.: a cada 30 min ou a cada 1 hora.",
        Lang::Es => "El intervalo mínimo para recordatorios recurrentes es 30 minutos. Ej.: cada 30 min o cada 1 hora.",
        Lang::En => "The minimum interval for recurring reminders is 30 minutes. E.g. every 30 min or every 1 hour.",
    }
}

pub fn reminder_date_past_ask_next_year(lang: Lang) -> &'static str {
    match lang {
        Lang::PtPt => "Essa data já passou. Queres que eu agende para o ano que vem à mesma data e hora? (1=sim 2=não)",
        Lang::PtBr => "Essa data já passou. Quer que eu agende para o ano que vem à mesma data e hora? (1=sim 2=não)",
        Lang::Es => "Esa fecha ya pasó. ¿Quieres que lo programe para el año que viene a la misma fecha y hora? (1=sí 2=no)",
        Lang::En => "That date has already passed. Should I schedule it for next year at the same date and time? (1=yes 2=no)",
    }
}

pub fn reminder_date_past_scheduled(lang: Lang) -> &'static str {
    match lang {
        Lang::PtPt => "Registado para o ano que vem. ✨",
        Lang::PtBr => "Registrado para o ano que vem. ✨",
        Lang::Es => "Programado para el año que viene. ✨",
        Lang::En => "Scheduled for next year. ✨",
    }
}

pub fn stale_removal_apology(lang: Lang, count: usize, removed_list: &str) -> String {
    match lang {
        Lang::PtPt => format!("Peço desculpa: removi {count} lembrete(s) que estavam no passado e não deviam estar na lista: {removed_list}. Já aprendi com isto e o erro não se vai repetir. 🙏"),
        Lang::PtBr => format!("Peço desculpa: removi {count} lembrete(s) que estavam no passado e não deviam estar na lista: {removed_list}. Já aprendi com isso e o erro não vai se repetir. 🙏"),
        Lang::Es => format!("Lo siento: he eliminado {count} recordatorio(s) que estaban en el pasado y no deberían estar en la lista: {removed_list}. Ya he aprendido y el error no se repetirá. 🙏"),
        Lang::En => format!("I'm sorry: I removed {count} reminder(s) that were in the past and shouldn't have been in the list: {removed_list}. I've learned from this and the error won't happen again. 🙏"),
    }
}

pub fn reminder_ask_time(lang: Lang, consulta: bool) -> &'static str {
    match (lang, consulta) {
        (Lang::PtPt, true) => "A que horas é a tua consulta?",
        (Lang::PtBr, true) => "A que horas é a sua consulta?",
        (Lang::Es, true) => "¿A qué hora es tu cita?",
        (Lang::En, true) => "What time is your appointment?",
        (Lang::PtPt | Lang::PtBr, false) => "A que horas é?",
        (Lang::Es, false) => "¿A qué hora es?",
        (Lang::En, false) => "What time is it?",
    }
}

pub fn reminder_ask_date(lang: Lang, consulta: bool) -> &'static str {
    match (lang, consulta) {
        (Lang::PtPt, true) => "Que dia é a tua consulta? Amanhã? Hoje? Segunda?",
        (Lang::PtBr, true) => "Que dia é a sua consulta? Amanhã? Hoje? Segunda?",
        (Lang::Es, true) => "¿Qué día es tu cita? ¿Mañana? ¿Hoy? ¿Lunes?",
        (Lang::En, true) => "What day is your appointment? Tomorrow? Today? Monday?",
        (Lang::PtPt | Lang::PtBr, false) => "Que dia é? Amanhã? Hoje? Segunda?",
        (Lang::Es, false) => "¿Qué día es? ¿Mañana? ¿Hoy? ¿Lunes?",
        (Lang::En, false) => "What day is it? Tomorrow? Today? Monday?",
    }
}

pub fn reminder_ask_advance_preference(lang: Lang) -> &'static str {
    match lang {
        Lang::PtPt => "Queres ser lembrado com antecedência ou apenas na hora do evento?",
        Lang::PtBr => "Quer ser lembrado com antecedência ou apenas na hora do evento?",
        Lang::Es => "¿Quieres que te avise con antelación o solo a la hora del evento?",
        Lang::En => "Do you want to be reminded in advance or just at the event time?",
    }
}

pub fn reminder_ask_advance_amount(lang: Lang) -> &'static str {
    match lang {
        Lang::PtPt | Lang::PtBr => "Quanto tempo antes? Por ex.: 30 min, 1 hora...",
        Lang::Es => "¿Cuánto tiempo antes? Ej.: 30 min, 1 hora...",
        Lang::En => "How long before? E.g.: 30 min, 1 hour...",
    }
}

pub fn reminder_ask_again(lang: Lang, attempt: u32) -> String {
    let base = match lang {
        Lang::PtPt => "Não percebi. Tenta novamente — preciso de evento, data e hora para registrar.",
        Lang::PtBr => "Não entendi. Tente novamente — preciso do evento, data e hora para registrar.",
        Lang::Es => "No entendí. Intenta de nuevo — necesito evento, fecha y hora para registrar.",
        Lang::En => "I didn't get that. Try again — I need event, date and time to register.",
    };
    let suffix = match lang {
        Lang::Es => format!(" ({attempt} de 3 intentos)"),
        Lang::En => format!(" ({attempt} of 3 attempts)"),
        _ => format!(" ({attempt} de 3 tentativas)"),
    };
    format!("{base}{suffix}")
}

pub fn reminder_failed_no_info(lang: Lang) -> &'static str {
    match lang {
        Lang::PtPt => "Não consegui registrar o lembrete por falta de informação. Preciso do evento, data e hora. Quando tiver os três, pode tentar de novo.",
        Lang::PtBr => "Não consegui registrar o lembrete por falta de informação. Preciso do evento, data e hora. Quando tiver os três, pode tentar novamente.",
        Lang::Es => "No pude registrar el recordatorio por falta de información. Necesito evento, fecha y hora. Cuando tengas los tres, puedes intentar de nuevo.",
        Lang::En => "I couldn't register the reminder due to lack of information. I need event, date and time. When you have all three, you can try again.",
    }
}

pub fn recurring_event_confirm(lang: Lang, event: &str, schedule: &str) -> String {
    match lang {
        Lang::PtPt => format!("Parece que {event} é um evento recorrente! Queres que eu registe para {schedule}? 😊"),
        Lang::PtBr => format!("Parece que {event} é um evento recorrente! Quer que eu registe para {schedule}? 😊"),
        Lang::Es => format!("¡Parece que {event} es un evento recurrente! ¿Quieres que lo registre para {schedule}? 😊"),
        Lang::En => format!("It looks like {event} is a recurring event! Shall I register it for {schedule}? 😊"),
    }
}

pub fn recurring_ask_end_date(lang: Lang) -> &'static str {
    match lang {
        Lang::PtPt => "Até quando dura? (ex: indefinido/para sempre, fim da semana, fim do mês, ou diz a data)",
        Lang::PtBr => "Até quando dura? (ex: indefinido/para sempre, fim da semana, fim do mês, ou diga a data)",
        Lang::Es => "¿Hasta cuándo dura? (ej: indefinido/para siempre, fin de semana, fin de mes, o di la fecha)",
        Lang::En => "Until when does it last? (e.g. indefinite/forever, end of week, end of month, or give the date)",
    }
}

pub fn recurring_ask_end_date_again(lang: Lang) -> &'static str {
    match lang {
        Lang::PtPt => "Não percebi. Indefinido/para sempre, fim da semana, ou fim do mês?",
        Lang::PtBr => "Não entendi. Indefinido/para sempre, fim da semana, ou fim do mês?",
        Lang::Es => "No entendí. ¿Indefinido/para siempre, fin de semana o fin de mes?",
        Lang::En => "I didn't get that. Indefinite/forever, end of week, or end of month?",
    }
}

pub fn recurring_registered(lang: Lang, event: &str, schedule: &str, until: Option<&str>) -> String {
    match (lang, until) {
        (Lang::PtPt, None) => format!("Registado! ✨ Lembrete recorrente para {event} ({schedule}). Podes remover quando quiseres com 👎, /lembrete ou pedindo ao assistente."),
        (Lang::PtBr, None) => format!("Registrado! ✨ Lembrete recorrente para {event} ({schedule}). Pode remover quando quiser com 👎, /lembrete ou pedindo ao assistente."),
        (Lang::Es, None) => format!("¡Registrado! ✨ Recordatorio recurrente para {event} ({schedule}). Puedes eliminarlo cuando quieras con 👎, /lembrete o pidiendo al asistente."),
        (Lang::En, None) => format!("Registered! ✨ Recurring reminder for {event} ({schedule}). You can remove it anytime with 👎, /lembrete or by asking the assistant."),
        (Lang::PtPt, Some(end)) => format!("Registado até {end}! ✨ Lembrete recorrente para {event} ({schedule}). Podes remover com 👎, /lembrete ou pedindo ao assistente."),
        (Lang::PtBr, Some(end)) => format!("Registrado até {end}! ✨ Lembrete recorrente para {event} ({schedule}). Pode remover com 👎, /lembrete ou pedindo ao assistente."),
        (Lang::Es, Some(end)) => format!("¡Registrado hasta {end}! ✨ Recordatorio recurrente para {event} ({schedule}). Puedes eliminar con 👎, /lembrete o pidiendo al asistente."),
        (Lang::En, Some(end)) => format!("Registered until {end}! ✨ Recurring reminder for {event} ({schedule}). Remove with 👎, /lembrete or by asking the assistant."),
    }
}

pub fn limit_reminders_per_day_reached(lang: Lang) -> &'static str {
    match lang {
        Lang::PtPt => "Atingiste o limite de 40 lembretes para este dia. Remove alguns com 👎 ou /lembrete antes de adicionar mais.",
        Lang::PtBr => "Você atingiu o limite de 40 lembretes para este dia. Remova alguns com 👎 ou /lembrete antes de adicionar mais.",
        Lang::Es => "Has alcanzado el límite de 40 recordatorios para este día. Elimina algunos con 👎 o /lembrete antes de añadir más.",
        Lang::En => "You've reached the limit of 40 reminders for this day. Remove some with 👎 or /lembrete before adding more.",
    }
}

pub fn limit_agenda_per_day_reached(lang: Lang) -> &'static str {
    match lang {
        Lang::PtPt => "Atingiste o limite de 40 eventos de agenda para este dia. Remove alguns da agenda antes de adicionar mais.",
        Lang::PtBr => "Você atingiu o limite de 40 eventos de agenda para este dia. Remova alguns da agenda antes de adicionar mais.",
        Lang::Es => "Has alcanzado el límite de 40 eventos de agenda para este día. Elimina algunos antes de añadir más.",
        Lang::En => "You've reached the limit of 40 agenda events for this day. Remove some from your agenda before adding more.",
    }
}

pub fn limit_total_per_day_reached(lang: Lang) -> &'static str {
    match lang {
        Lang::PtPt => "Atingiste o limite de 80 itens (agenda + lembretes) para este dia. Remove alguns antes de adicionar mais.",
        Lang::PtBr => "Você atingiu o limite de 80 itens (agenda + lembretes) para este dia. Remova alguns antes de adicionar mais.",
        Lang::Es => "Has alcanzado el límite de 80 ítems (agenda + recordatorios) para este día. Elimina algunos antes de añadir más.",
        Lang::En => "You've reached the limit of 80 items (agenda + reminders) for this day. Remove some before adding more.",
    }
}

pub fn limit_warning_70(lang: Lang) -> &'static str {
    match lang {
        Lang::PtPt => "Estás a 70% do limite diário (40 eventos de agenda, 40 lembretes, 80 no total). Convém não ultrapassar.",
        Lang::PtBr => "Você está em 70% do limite diário (40 eventos de agenda, 40 lembretes, 80 no total). Convém não ultrapassar.",
        Lang::Es => "Estás al 70% del límite diario (40 eventos de agenda, 40 recordatorios, 80 en total). Conviene no superar.",
        Lang::En => "You're at 70% of the daily limit (40 agenda events, 40 reminders, 80 total). Best not to exceed it.",
    }
}

pub fn duplicate_reminder(lang: Lang, job_id: &str) -> String {
    match lang {
        Lang::PtPt | Lang::PtBr => format!("Este lembrete já está registado. (id: {job_id})"),
        Lang::Es => format!("Ese recordatorio ya está registrado. (id: {job_id})"),
        Lang::En => format!("That reminder is already registered. (id: {job_id})"),
    }
}

pub fn reminder_scheduled(lang: Lang, job_id: &str) -> String {
    match lang {
        Lang::PtPt | Lang::PtBr => format!("Lembrete agendado (id: {job_id})."),
        Lang::Es => format!("Recordatorio programado (id: {job_id})."),
        Lang::En => format!("Reminder scheduled (id: {job_id})."),
    }
}

pub fn reminder_will_fire_at(lang: Lang, time_str: &str) -> String {
    match lang {
        Lang::PtPt | Lang::PtBr => format!(" Será enviado às {time_str} (no teu fuso)."),
        Lang::Es => format!(" Se enviará a las {time_str} (en tu huso)."),
        Lang::En => format!(" It will be sent at {time_str} (your timezone)."),
    }
}

pub fn quiet_window_set(lang: Lang, start: &str, end: &str) -> String {
    match lang {
        Lang::PtPt | Lang::PtBr => format!("Janela de silêncio definida: {start}–{end}. Lembretes nesse período ficam para depois."),
        Lang::Es => format!("Ventana de silencio definida: {start}–{end}. Los recordatorios en ese período quedan para después."),
        Lang::En => format!("Quiet window set: {start}–{end}. Reminders in that period are pushed past it."),
    }
}

pub fn tz_set_confirmation(lang: Lang, tz: &str) -> String {
    match lang {
        Lang::PtPt | Lang::PtBr => format!("Fuso horário definido: {tz}. ✨"),
        Lang::Es => format!("Huso horario definido: {tz}. ✨"),
        Lang::En => format!("Timezone set: {tz}. ✨"),
    }
}

pub fn reset_done(lang: Lang) -> &'static str {
    match lang {
        Lang::PtPt => "Cadastro limpo. Vamos recomeçar: em que cidade estás? 🌍",
        Lang::PtBr => "Cadastro limpo. Vamos recomeçar: em que cidade você está? 🌍",
        Lang::Es => "Registro limpio. Empecemos de nuevo: ¿en qué ciudad estás? 🌍",
        Lang::En => "Profile cleared. Let's start over: which city are you in? 🌍",
    }
}

pub fn confirm_export(lang: Lang) -> &'static str {
    match lang {
        Lang::PtPt => "Queres exportar todos os teus dados (listas, eventos, lembretes)? (1=sim 2=não)",
        Lang::PtBr => "Quer exportar todos os seus dados (listas, eventos, lembretes)? (1=sim 2=não)",
        Lang::Es => "¿Quieres exportar todos tus datos (listas, eventos, recordatorios)? (1=sí 2=no)",
        Lang::En => "Do you want to export all your data (lists, events, reminders)? (1=yes 2=no)",
    }
}

pub fn confirm_delete_all(lang: Lang) -> &'static str {
    match lang {
        Lang::PtPt => "Isto apaga TODAS as tuas listas, eventos e lembretes. De certeza? (1=sim 2=não)",
        Lang::PtBr => "Isso apaga TODAS as suas listas, eventos e lembretes. Tem certeza? (1=sim 2=não)",
        Lang::Es => "Esto borra TODAS tus listas, eventos y recordatorios. ¿Seguro? (1=sí 2=no)",
        Lang::En => "This deletes ALL your lists, events and reminders. Are you sure? (1=yes 2=no)",
    }
}

pub fn cancelled(lang: Lang) -> &'static str {
    match lang {
        Lang::PtPt | Lang::PtBr => "Ok, cancelado. 😊",
        Lang::Es => "Ok, cancelado. 😊",
        Lang::En => "Ok, cancelled. 😊",
    }
}

pub fn snooze_confirmation(lang: Lang, count: u32) -> String {
    match lang {
        Lang::PtPt | Lang::PtBr => format!("Adiado 5 min. ({count}/3)"),
        Lang::Es => format!("Pospuesto 5 min. ({count}/3)"),
        Lang::En => format!("Snoozed 5 min. ({count}/3)"),
    }
}

pub fn snooze_limit_reached(lang: Lang) -> &'static str {
    match lang {
        Lang::PtPt => "Já adiaste 3 vezes — este é o limite. O lembrete mantém-se como está.",
        Lang::PtBr => "Você já adiou 3 vezes — esse é o limite. O lembrete fica como está.",
        Lang::Es => "Ya pospusiste 3 veces — ese es el límite. El recordatorio queda como está.",
        Lang::En => "You've snoozed 3 times — that's the limit. The reminder stays as is.",
    }
}

pub fn reminder_done_confirmation(lang: Lang) -> &'static str {
    match lang {
        Lang::PtPt => "Boa! Marcado como feito. ✅",
        Lang::PtBr => "Boa! Marcado como feito. ✅",
        Lang::Es => "¡Bien! Marcado como hecho. ✅",
        Lang::En => "Nice! Marked as done. ✅",
    }
}

pub fn reminder_thumbs_down_ask(lang: Lang) -> &'static str {
    match lang {
        Lang::PtPt => "Queres alterar o horário ou cancelar o lembrete? (1=alterar 2=cancelar)",
        Lang::PtBr => "Você quer alterar o horário ou cancelar o lembrete? (1=alterar 2=cancelar)",
        Lang::Es => "¿Quieres cambiar el horario o cancelar el recordatorio? (1=cambiar 2=cancelar)",
        Lang::En => "Do you want to change the time or cancel the reminder? (1=change 2=cancel)",
    }
}

pub fn list_or_reminders_choice(lang: Lang) -> &'static str {
    match lang {
        Lang::PtPt => "Queres que eu guarde isso como lista, como lembretes, ou ambos? (1=lista 2=lembretes 3=ambos)",
        Lang::PtBr => "Quer que eu guarde isso como lista, como lembretes, ou ambos? (1=lista 2=lembretes 3=ambos)",
        Lang::Es => "¿Quieres que lo guarde como lista, como recordatorios, o ambos? (1=lista 2=recordatorios 3=ambos)",
        Lang::En => "Should I save that as a list, as reminders, or both? (1=list 2=reminders 3=both)",
    }
}
