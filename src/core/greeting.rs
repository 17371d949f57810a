/// 問候語，供容器入口指令使用
pub fn hello(name: &str) -> String {
    format!("Hello, {}!", name)
}
