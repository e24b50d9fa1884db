//! Simulated weather lookup

use std::fmt;
use std::future;

use rand::Rng;
use validator::{Validate, ValidationErrors};

use crate::error::{InvocationError, RegistryError};
use crate::mcp::registry::{OperationDefinition, OperationRegistry};
use crate::mcp::schema::{FieldKind, InputSchema};
use crate::mcp::validate::Arguments;

pub const SERVER_NAME: &str = "weather-server";
pub const SERVER_VERSION: &str = "1.0.0";

/// Sky conditions the simulator picks from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Sunny,
    Cloudy,
    Rainy,
    Snowy,
}

impl Condition {
    pub const ALL: [Condition; 4] = [
        Condition::Sunny,
        Condition::Cloudy,
        Condition::Rainy,
        Condition::Snowy,
    ];
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Condition::Sunny => "Sunny",
            Condition::Cloudy => "Cloudy",
            Condition::Rainy => "Rainy",
            Condition::Snowy => "Snowy",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Validate)]
struct WeatherRequest {
    #[validate(length(min = 1, message = "Location is required"))]
    location: String,
}

/// One simulated observation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherReport {
    pub location: String,
    pub temperature: u32,
    pub condition: Condition,
    pub humidity: u32,
    pub wind_speed: u32,
}

impl WeatherReport {
    /// Draw a report for `location` from `rng`
    pub fn simulate<R: Rng + ?Sized>(location: &str, rng: &mut R) -> Self {
        Self {
            location: location.to_string(),
            temperature: rng.gen_range(5..35),
            condition: Condition::ALL[rng.gen_range(0..Condition::ALL.len())],
            humidity: rng.gen_range(30..70),
            wind_speed: rng.gen_range(5..25),
        }
    }
}

impl fmt::Display for WeatherReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Weather in {}:\nTemperature: {}°C\nCondition: {}\nHumidity: {}%\nWind Speed: {} km/h",
            self.location, self.temperature, self.condition, self.humidity, self.wind_speed
        )
    }
}

/// Build the weather catalog; each call draws from the thread-local generator
pub fn registry() -> Result<OperationRegistry, RegistryError> {
    registry_with_rng(rand::thread_rng)
}

/// Build the weather catalog with `make_rng` supplying a fresh generator per call.
///
/// No generator state is shared between invocations.
pub fn registry_with_rng<F, R>(make_rng: F) -> Result<OperationRegistry, RegistryError>
where
    F: Fn() -> R + Send + Sync + 'static,
    R: Rng,
{
    OperationRegistry::with_operations([OperationDefinition::new(
        "get_weather",
        "Get current weather information for a location",
        InputSchema::new().required(
            "location",
            FieldKind::String,
            "The city or location to get weather for",
        ),
        move |args: Arguments| future::ready(get_weather(&args, &mut make_rng())),
    )])
}

fn get_weather<R: Rng + ?Sized>(args: &Arguments, rng: &mut R) -> Result<String, InvocationError> {
    let request = WeatherRequest {
        location: args.string("location")?.to_string(),
    };
    request
        .validate()
        .map_err(|e| InvocationError::domain(first_message(&e)))?;

    Ok(WeatherReport::simulate(&request.location, rng).to_string())
}

fn first_message(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errs| errs.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| errors.to_string())
}
