//! Fixed spoken phrases

use rand::seq::SliceRandom;

pub const WELCOME_MESSAGES: &[&str] = &[
    "¡Hola! Soy EndyOS y estoy listo para lo que se te ocurra.",
    "¡Saludos! Soy EndyOS, tu compañero digital favorito. ¿Comenzamos?",
    "¡Hey! EndyOS aquí. ¿Qué tal si empezamos con algo interesante?",
    "EndyOS activado. ¿En qué aventura digital nos metemos hoy?",
];

pub const THINKING_MESSAGES: &[&str] = &[
    "EndyOS procesando... Dame un segundo que estoy pensando.",
    "Hmm, déjame analizar esto con mi cerebro EndyOS...",
    "EndyOS calculando... Un momento mientras proceso tu solicitud.",
    "Dame un momento para procesar tu consulta...",
];

/// Offline fun facts used when the trivia backend fails
pub const LOCAL_FACTS: &[&str] = &[
    "Los pulpos tienen tres corazones y sangre azul.",
    "Un rayo es cinco veces más caliente que la superficie del Sol.",
    "Los humanos comparten el 60% de su ADN con los plátanos.",
    "Un día en Venus dura más que un año en Venus.",
    "El corazón de una ballena azul es tan grande como un auto pequeño.",
];

/// Pick one phrase at random; empty lists yield an empty string
pub fn random_message(messages: &[&'static str]) -> &'static str {
    messages
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_message_comes_from_list() {
        for _ in 0..20 {
            assert!(LOCAL_FACTS.contains(&random_message(LOCAL_FACTS)));
        }
        assert_eq!(random_message(&[]), "");
    }
}
