//! Built-in HSK1 content so the service is useful without a bank file.

use crate::domain::QuizItem;

fn item(id: u32, prompt: &str, pinyin: &str, correct: &str, options: [&str; 4]) -> QuizItem {
  QuizItem {
    id,
    prompt: prompt.into(),
    pinyin: pinyin.into(),
    correct_text: correct.into(),
    options: options.iter().map(|s| s.to_string()).collect(),
  }
}

/// HSK1 vocabulary: Chinese word → English meaning.
pub fn seed_words() -> Vec<QuizItem> {
  vec![
    item(1, "爱", "ài", "to love", ["to love", "to eat", "to sleep", "to read"]),
    item(2, "八", "bā", "eight", ["six", "eight", "nine", "ten"]),
    item(3, "爸爸", "bàba", "father", ["mother", "brother", "father", "teacher"]),
    item(4, "杯子", "bēizi", "cup", ["cup", "table", "chair", "bowl"]),
    item(5, "北京", "Běijīng", "Beijing", ["Shanghai", "Beijing", "China", "Hong Kong"]),
    item(6, "吃", "chī", "to eat", ["to drink", "to cook", "to eat", "to buy"]),
    item(7, "出租车", "chūzūchē", "taxi", ["bus", "taxi", "train", "airplane"]),
    item(8, "电脑", "diànnǎo", "computer", ["television", "telephone", "computer", "movie"]),
    item(9, "电视", "diànshì", "television", ["television", "computer", "radio", "film"]),
    item(10, "东西", "dōngxi", "thing", ["east", "west", "thing", "place"]),
    item(11, "飞机", "fēijī", "airplane", ["airplane", "airport", "taxi", "ticket"]),
    item(12, "工作", "gōngzuò", "to work", ["to study", "to work", "to rest", "to play"]),
    item(13, "汉语", "Hànyǔ", "Chinese language", ["English language", "Chinese character", "Chinese language", "Chinese people"]),
    item(14, "好", "hǎo", "good", ["bad", "big", "good", "small"]),
    item(15, "喝", "hē", "to drink", ["to eat", "to drink", "to see", "to say"]),
    item(16, "家", "jiā", "home", ["school", "home", "hospital", "shop"]),
    item(17, "老师", "lǎoshī", "teacher", ["student", "doctor", "teacher", "friend"]),
    item(18, "妈妈", "māma", "mother", ["mother", "father", "sister", "daughter"]),
    item(19, "米饭", "mǐfàn", "cooked rice", ["noodles", "cooked rice", "dumplings", "bread"]),
    item(20, "朋友", "péngyou", "friend", ["friend", "classmate", "neighbor", "son"]),
    item(21, "苹果", "píngguǒ", "apple", ["banana", "pear", "apple", "orange"]),
    item(22, "水", "shuǐ", "water", ["tea", "water", "milk", "coffee"]),
    item(23, "学校", "xuéxiào", "school", ["hospital", "restaurant", "school", "station"]),
    item(24, "医院", "yīyuàn", "hospital", ["hospital", "doctor", "school", "hotel"]),
  ]
}

/// HSK1 sentences: Chinese sentence → English translation.
pub fn seed_sentences() -> Vec<QuizItem> {
  vec![
    item(1, "我爱你。", "Wǒ ài nǐ.", "I love you", ["I dislike you", "I like you", "I hate you", "I love you"]),
    item(2, "你的爱好是什么？", "Nǐ de àihào shì shénme?", "What is your hobby?", ["What's your favorite thing?", "Where is your hobby?", "What is your hobby?", "Do you have a hobby?"]),
    item(3, "他八岁了。", "Tā bā suì le.", "He is eight years old", ["He is eight years old", "He is five years old", "He is ten years old", "He is eighteen years old"]),
    item(4, "我爸爸是老师。", "Wǒ bàba shì lǎoshī.", "My father is a teacher", ["My father is a teacher", "My brother is a teacher", "My teacher is my father", "My father is a doctor"]),
    item(5, "杯子里有茶。", "Bēizi lǐ yǒu chá.", "There is tea in the cup", ["There is tea in the cup", "There is milk in the cup", "There is tea on the table", "The cup is full of water"]),
    item(6, "他在医院工作。", "Tā zài yīyuàn gōngzuò.", "He works in a hospital", ["He works in a hospital", "He studies in a school", "He works at home", "He is in the market"]),
    item(7, "我们坐出租车去。", "Wǒmen zuò chūzūchē qù.", "We go by taxi", ["We go by taxi", "We go on foot", "We go by bus", "We go by car"]),
    item(8, "我不会游泳。", "Wǒ bú huì yóuyǒng.", "I can't swim", ["I can't swim", "I don't like swimming", "I can swim", "I'm learning to swim"]),
    item(9, "今天的天气很好。", "Jīntiān de tiānqì hěn hǎo.", "Today's weather is good", ["Today's weather is bad", "It's raining today", "Today's weather is good", "It's cold today"]),
    item(10, "他买了一个新电脑。", "Tā mǎi le yí gè xīn diànnǎo.", "He bought a new computer", ["He bought a new computer", "He has an old computer", "He borrowed a computer", "He sold his computer"]),
    item(11, "我喜欢吃米饭。", "Wǒ xǐhuan chī mǐfàn.", "I like eating rice", ["I like eating rice", "I don't eat rice", "I like drinking tea", "I'm full"]),
    item(12, "她是我的朋友。", "Tā shì wǒ de péngyou.", "She is my friend", ["She is my sister", "She is my friend", "She is my teacher", "She is not my friend"]),
    item(13, "我每天都学习汉语。", "Wǒ měitiān dōu xuéxí Hànyǔ.", "I study Chinese every day", ["I don't like Chinese", "I study Chinese every day", "I study English", "I study sometimes"]),
    item(14, "你住在哪儿？", "Nǐ zhù zài nǎr?", "Where do you live?", ["Who are you?", "Where are you going?", "Where do you live?", "What's your name?"]),
    item(15, "我想喝水。", "Wǒ xiǎng hē shuǐ.", "I want to drink water", ["I'm full", "I don't like water", "I want to drink water", "I'm eating now"]),
    item(16, "你会说汉语吗？", "Nǐ huì shuō Hànyǔ ma?", "Can you speak Chinese?", ["Can you speak Chinese?", "Do you understand?", "Do you write Chinese?", "Can you read Chinese?"]),
    item(17, "我去学校。", "Wǒ qù xuéxiào.", "I'm going to school", ["I'm at school", "I'm going home", "I'm going to school", "I'm studying"]),
    item(18, "妈妈在厨房做饭。", "Māma zài chúfáng zuò fàn.", "Mom is cooking in the kitchen", ["Mom is sleeping", "Mom is cooking in the kitchen", "Mom is eating", "Mom is at work"]),
    item(19, "现在几点？", "Xiànzài jǐ diǎn?", "What time is it now?", ["What day is it today?", "What time is it now?", "What's the date?", "Where are we?"]),
    item(20, "明天见！", "Míngtiān jiàn!", "See you tomorrow!", ["Good morning!", "Good night!", "See you tomorrow!", "See you later!"]),
    item(21, "请坐。", "Qǐng zuò.", "Please sit", ["Please sit", "Please stand", "Please wait", "Please eat"]),
    item(22, "你叫什么名字？", "Nǐ jiào shénme míngzi?", "What's your name?", ["What's your name?", "Where do you live?", "How are you?", "How old are you?"]),
    item(23, "他不在家。", "Tā bú zài jiā.", "He is not at home", ["He is at home", "He is not at home", "He is in bed", "He is eating"]),
    item(24, "老师好！", "Lǎoshī hǎo!", "Hello, teacher!", ["Goodbye, teacher!", "Hello, teacher!", "Good morning, class!", "Hello, friend!"]),
  ]
}
